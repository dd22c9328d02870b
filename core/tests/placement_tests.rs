// tests/placement_tests.rs
mod common;

use bookstore::model::OrderStatus;
use bookstore::{BookStore, BookstoreError, FailPoint, MemoryStore, OrderSettings, TotalAmountPolicy};
use common::*;
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_order_decrements_stock_and_snapshots_lines() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);

  let placed = orders
    .place_order(user("reader-1"), order_request(vec![line(&b1, 3)]))
    .await
    .expect("placement succeeds");

  assert_eq!(store.book(b1.book_id).unwrap().stock_quantity, 2);
  assert_eq!(store.order_count(), 1);
  assert_eq!(store.purchase_item_count(), 1);

  assert_eq!(placed.order.status, OrderStatus::Processing);
  assert_eq!(placed.order.user_id, user("reader-1"));
  assert_eq!(placed.order.order_amount_cents, 3000);
  assert_eq!(placed.order.recipient_name, "Grace Hopper");
  assert_eq!(placed.items.len(), 1);
  let item = &placed.items[0];
  assert_eq!(item.order_id, placed.order.order_id);
  assert_eq!(item.book_id, b1.book_id);
  assert_eq!(item.quantity, 3);
  assert_eq!(item.amount_cents, 3000);
  assert_eq!(item.cover_image, b1.cover_image);
}

#[tokio::test]
async fn test_insufficient_stock_rejects_without_any_write() {
  setup_tracing();
  let b1 = book("B1", 2, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);

  let err = orders
    .place_order(user("reader-1"), order_request(vec![line(&b1, 5)]))
    .await
    .unwrap_err();

  match err {
    BookstoreError::InsufficientStock(short) => {
      assert_eq!(short.len(), 1);
      assert_eq!(short[0].book_id, b1.book_id);
      assert_eq!(short[0].quantity, 5);
    }
    other => panic!("Expected InsufficientStock, got {:?}", other),
  }
  assert_eq!(store.book(b1.book_id).unwrap().stock_quantity, 2);
  assert_eq!(store.order_count(), 0);
  assert_eq!(store.purchase_item_count(), 0);
}

#[tokio::test]
async fn test_every_short_item_is_reported_and_nothing_changes() {
  setup_tracing();
  let plenty = book("Plenty", 10, 500);
  let scarce = book("Scarce", 1, 700);
  let gone = book("Gone", 0, 900);
  let store = MemoryStore::with_books([plenty.clone(), scarce.clone(), gone.clone()]);
  let before = store.list_books().await.unwrap();
  let orders = order_service(&store);

  let missing = book("Never stocked", 3, 100); // not in the store
  let err = orders
    .place_order(
      user("reader-2"),
      order_request(vec![line(&plenty, 2), line(&scarce, 2), line(&gone, 1), line(&missing, 1)]),
    )
    .await
    .unwrap_err();

  let BookstoreError::InsufficientStock(short) = err else {
    panic!("Expected InsufficientStock");
  };
  let short_ids: Vec<_> = short.iter().map(|i| i.book_id).collect();
  assert_eq!(short_ids, vec![scarce.book_id, gone.book_id, missing.book_id]);

  assert_eq!(store.list_books().await.unwrap(), before);
  assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn test_repeated_book_lines_are_checked_cumulatively() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);

  let err = orders
    .place_order(user("reader-3"), order_request(vec![line(&b1, 3), line(&b1, 3)]))
    .await
    .unwrap_err();
  let BookstoreError::InsufficientStock(short) = err else {
    panic!("Expected InsufficientStock");
  };
  assert_eq!(short.len(), 1, "only the second line exceeds what is left");
  assert_eq!(store.book(b1.book_id).unwrap().stock_quantity, 5);

  let placed = orders
    .place_order(user("reader-3"), order_request(vec![line(&b1, 2), line(&b1, 3)]))
    .await
    .unwrap();
  assert_eq!(placed.items.len(), 2);
  assert_eq!(store.book(b1.book_id).unwrap().stock_quantity, 0);
}

#[tokio::test]
async fn test_store_failure_mid_transaction_rolls_back_stock() {
  setup_tracing();
  let a = book("A", 4, 100);
  let b = book("B", 4, 200);
  let store = MemoryStore::with_books([a.clone(), b.clone()]);
  let orders = order_service(&store);

  for point in [FailPoint::AdjustStock, FailPoint::InsertOrder, FailPoint::InsertPurchaseItem, FailPoint::Commit] {
    store.inject_failure(point);
    let err = orders
      .place_order(user("reader-4"), order_request(vec![line(&a, 1), line(&b, 2)]))
      .await
      .unwrap_err();
    assert!(err.is_infrastructure(), "{:?} should surface as a store failure", point);
    assert_eq!(store.book(a.book_id).unwrap().stock_quantity, 4);
    assert_eq!(store.book(b.book_id).unwrap().stock_quantity, 4);
    assert_eq!(store.order_count(), 0);
    assert_eq!(store.purchase_item_count(), 0);
  }

  // Fail points are one-shot; the next placement goes through.
  orders
    .place_order(user("reader-4"), order_request(vec![line(&a, 1), line(&b, 2)]))
    .await
    .unwrap();
  assert_eq!(store.book(b.book_id).unwrap().stock_quantity, 2);
}

#[tokio::test]
async fn test_invalid_requests_never_open_a_transaction() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);

  // A begin failure would win if the engine reached the store.
  store.inject_failure(FailPoint::Begin);
  let err = orders
    .place_order(user("reader-5"), order_request(vec![line(&b1, 0)]))
    .await
    .unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(_)));

  let err = orders.place_order(user("reader-5"), order_request(vec![])).await.unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(_)));

  let err = orders
    .place_order(user("reader-5"), order_request(vec![line(&b1, 1)]))
    .await
    .unwrap_err();
  assert!(err.is_infrastructure(), "the armed begin failure is consumed here");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_never_oversell_last_copy() {
  setup_tracing();
  let last = book("Last copy", 1, 1500);
  let store = MemoryStore::with_books([last.clone()]);
  let orders = order_service(&store);
  let barrier = Arc::new(Barrier::new(2));

  let mut handles = Vec::new();
  for buyer in ["buyer-a", "buyer-b"] {
    let orders = orders.clone();
    let barrier = Arc::clone(&barrier);
    let request = order_request(vec![line(&last, 1)]);
    handles.push(tokio::spawn(async move {
      barrier.wait().await;
      orders.place_order(user(buyer), request).await
    }));
  }

  let mut successes = 0;
  let mut rejections = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => successes += 1,
      Err(BookstoreError::InsufficientStock(_)) => rejections += 1,
      Err(other) => panic!("Unexpected error: {:?}", other),
    }
  }

  assert_eq!(successes, 1);
  assert_eq!(rejections, 1);
  assert_eq!(store.book(last.book_id).unwrap().stock_quantity, 0);
  assert_eq!(store.order_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_buyers_sell_exactly_the_stock() {
  setup_tracing();
  let hot = book("Hot release", 7, 2000);
  let store = MemoryStore::with_books([hot.clone()]);
  let orders = order_service(&store);

  let handles: Vec<_> = (0..25)
    .map(|n| {
      let orders = orders.clone();
      let request = order_request(vec![line(&hot, 1)]);
      tokio::spawn(async move { orders.place_order(user(&format!("fan-{}", n)), request).await })
    })
    .collect();

  let mut sold = 0;
  for handle in handles {
    if handle.await.unwrap().is_ok() {
      sold += 1;
    }
  }
  assert_eq!(sold, 7);
  assert_eq!(store.book(hot.book_id).unwrap().stock_quantity, 0);
}

#[tokio::test]
async fn test_total_policy_trust_records_client_total() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);

  let mut request = order_request(vec![line(&b1, 2)]);
  request.total_amount_cents = 1;
  let placed = orders.place_order(user("reader-6"), request).await.unwrap();
  assert_eq!(placed.order.order_amount_cents, 1);
  assert_eq!(placed.items[0].amount_cents, 2000);
}

#[tokio::test]
async fn test_total_policy_recompute_uses_item_sum() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let b2 = book("B2", 5, 250);
  let store = MemoryStore::with_books([b1.clone(), b2.clone()]);
  let orders = order_service_with(
    &store,
    OrderSettings {
      total_policy: TotalAmountPolicy::Recompute,
      ..OrderSettings::default()
    },
  );

  let mut request = order_request(vec![line(&b1, 2), line(&b2, 3)]);
  request.total_amount_cents = 1;
  let placed = orders.place_order(user("reader-7"), request).await.unwrap();
  assert_eq!(placed.order.order_amount_cents, 2750);
}

#[tokio::test]
async fn test_missing_identity_is_recorded_as_is() {
  setup_tracing();
  let b1 = book("B1", 1, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let orders = order_service(&store);

  let placed = orders.place_order(user(""), order_request(vec![line(&b1, 1)])).await.unwrap();
  assert_eq!(placed.order.user_id.as_str(), "");
  assert_eq!(placed.items[0].user_id.as_str(), "");
}
