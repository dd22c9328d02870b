// tests/order_lifecycle_tests.rs
mod common;

use bookstore::model::{BookUpdate, OrderStatus};
use bookstore::{BookstoreError, CatalogService, MemoryStore, OrderSettings};
use common::*;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_get_order_is_scoped_to_owner() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);
  let placed = orders
    .place_order(user("owner"), order_request(vec![line(&b1, 1)]))
    .await
    .unwrap();

  let fetched = orders.get_order(&user("owner"), placed.order.order_id).await.unwrap();
  assert_eq!(fetched, placed);

  let err = orders.get_order(&user("intruder"), placed.order.order_id).await.unwrap_err();
  assert!(matches!(err, BookstoreError::NotFound { entity: "Order", .. }));

  let err = orders.get_order(&user("owner"), Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, BookstoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_get_order_twice_returns_identical_bytes() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let b2 = book("B2", 5, 1500);
  let store = MemoryStore::with_books([b1.clone(), b2.clone()]);
  let orders = order_service(&store);
  let placed = orders
    .place_order(user("reader"), order_request(vec![line(&b1, 1), line(&b2, 2)]))
    .await
    .unwrap();

  let first = serde_json::to_vec(&orders.get_order(&user("reader"), placed.order.order_id).await.unwrap()).unwrap();
  let second = serde_json::to_vec(&orders.get_order(&user("reader"), placed.order.order_id).await.unwrap()).unwrap();
  assert_eq!(first, second);
}

#[tokio::test]
async fn test_list_orders_newest_first_with_items() {
  setup_tracing();
  let b1 = book("B1", 10, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);

  let mut placed_ids = Vec::new();
  for qty in 1..=3 {
    let placed = orders
      .place_order(user("collector"), order_request(vec![line(&b1, qty)]))
      .await
      .unwrap();
    placed_ids.push(placed.order.order_id);
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
  }
  orders
    .place_order(user("someone-else"), order_request(vec![line(&b1, 1)]))
    .await
    .unwrap();

  let listed = orders.list_orders(&user("collector")).await.unwrap();
  let listed_ids: Vec<_> = listed.iter().map(|o| o.order.order_id).collect();
  placed_ids.reverse();
  assert_eq!(listed_ids, placed_ids);
  assert!(listed.iter().all(|o| o.items.len() == 1));
  assert_eq!(listed[0].items[0].quantity, 3);

  assert!(orders.list_orders(&user("nobody")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_price_change_does_not_touch_recorded_lines() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);
  let catalog = CatalogService::new(Arc::new(store.clone()));

  let placed = orders
    .place_order(user("reader"), order_request(vec![line(&b1, 3)]))
    .await
    .unwrap();

  catalog
    .update_book(
      b1.book_id,
      BookUpdate {
        price_cents: Some(9999),
        stock_quantity: None,
      },
    )
    .await
    .unwrap();

  let fetched = orders.get_order(&user("reader"), placed.order.order_id).await.unwrap();
  assert_eq!(fetched.items[0].price_cents, 1000);
  assert_eq!(fetched.items[0].amount_cents, 3000);
  assert_eq!(fetched.order.order_amount_cents, 3000);
}

#[tokio::test]
async fn test_status_update_is_permissive_by_default() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);
  let placed = orders
    .place_order(user("reader"), order_request(vec![line(&b1, 1)]))
    .await
    .unwrap();
  let id = placed.order.order_id;

  let delivered = orders.update_status(&user("reader"), id, OrderStatus::Delivered).await.unwrap();
  assert_eq!(delivered.status, OrderStatus::Delivered);

  // Moving backwards is accepted as long as strict transitions are off.
  let reopened = orders.update_status(&user("reader"), id, OrderStatus::Processing).await.unwrap();
  assert_eq!(reopened.status, OrderStatus::Processing);

  let err = orders
    .update_status(&user("stranger"), id, OrderStatus::Shipped)
    .await
    .unwrap_err();
  assert!(matches!(err, BookstoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_strict_status_transitions_reject_going_backwards() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service_with(
    &store,
    OrderSettings {
      strict_status_transitions: true,
      ..OrderSettings::default()
    },
  );
  let placed = orders
    .place_order(user("reader"), order_request(vec![line(&b1, 1)]))
    .await
    .unwrap();
  let id = placed.order.order_id;

  orders.update_status(&user("reader"), id, OrderStatus::Shipped).await.unwrap();
  let err = orders
    .update_status(&user("reader"), id, OrderStatus::Processing)
    .await
    .unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(_)));

  let delivered = orders.update_status(&user("reader"), id, OrderStatus::Delivered).await.unwrap();
  assert_eq!(delivered.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_delete_order_keeps_stock_decremented() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);
  let placed = orders
    .place_order(user("reader"), order_request(vec![line(&b1, 3)]))
    .await
    .unwrap();
  assert_eq!(store.book(b1.book_id).unwrap().stock_quantity, 2);

  let err = orders.delete_order(&user("stranger"), placed.order.order_id).await.unwrap_err();
  assert!(matches!(err, BookstoreError::NotFound { .. }));

  let deleted = orders.delete_order(&user("reader"), placed.order.order_id).await.unwrap();
  assert_eq!(deleted.order_id, placed.order.order_id);
  assert_eq!(store.order_count(), 0);
  assert_eq!(store.purchase_item_count(), 0);
  assert_eq!(store.book(b1.book_id).unwrap().stock_quantity, 2, "deleting an order does not restock");

  let err = orders.delete_order(&user("reader"), placed.order.order_id).await.unwrap_err();
  assert!(matches!(err, BookstoreError::NotFound { .. }));
}
