// tests/catalog_cart_tests.rs
mod common;

use bookstore::model::{BookUpdate, NewBook};
use bookstore::{BookstoreError, CartService, CartWrite, CatalogService, FailPoint, MemoryStore};
use common::*;
use std::sync::Arc;
use uuid::Uuid;

fn catalog(store: &MemoryStore) -> CatalogService {
  CatalogService::new(Arc::new(store.clone()))
}

fn carts(store: &MemoryStore) -> CartService {
  CartService::new(Arc::new(store.clone()))
}

#[tokio::test]
async fn test_create_and_search_books() {
  setup_tracing();
  let store = MemoryStore::new();
  let catalog = catalog(&store);

  let created = catalog
    .create_book(NewBook {
      title: "The Rust Programming Language".to_string(),
      author: "Steve Klabnik".to_string(),
      price_cents: 3999,
      stock_quantity: 12,
      ..NewBook::default()
    })
    .await
    .unwrap();
  catalog
    .create_book(NewBook {
      title: "Dune".to_string(),
      author: "Frank Herbert".to_string(),
      price_cents: 1299,
      ..NewBook::default()
    })
    .await
    .unwrap();

  assert_eq!(catalog.get_book(created.book_id).await.unwrap(), created);

  let titles: Vec<_> = catalog.list_books().await.unwrap().into_iter().map(|b| b.title).collect();
  assert_eq!(titles, vec!["Dune", "The Rust Programming Language"]);

  let by_author = catalog.search_books("KLABNIK").await.unwrap();
  assert_eq!(by_author.len(), 1);
  assert_eq!(by_author[0].book_id, created.book_id);

  assert_eq!(catalog.search_books("  ").await.unwrap().len(), 2);
  assert!(catalog.search_books("tolkien").await.unwrap().is_empty());

  let err = catalog
    .create_book(NewBook {
      title: String::new(),
      author: "Nobody".to_string(),
      ..NewBook::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(_)));
}

#[tokio::test]
async fn test_stock_update_goes_through_guarded_primitive() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let catalog = catalog(&store);

  let restocked = catalog.adjust_stock(b1.book_id, 4).await.unwrap();
  assert_eq!(restocked.stock_quantity, 9);

  let err = catalog.adjust_stock(b1.book_id, -10).await.unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(_)));
  assert_eq!(store.book(b1.book_id).unwrap().stock_quantity, 9);

  let updated = catalog
    .update_book(
      b1.book_id,
      BookUpdate {
        price_cents: Some(1100),
        stock_quantity: Some(2),
      },
    )
    .await
    .unwrap();
  assert_eq!(updated.price_cents, 1100);
  assert_eq!(updated.stock_quantity, 2);
  assert_eq!(store.book(b1.book_id).unwrap(), updated);

  let err = catalog.adjust_stock(Uuid::new_v4(), 1).await.unwrap_err();
  assert!(matches!(err, BookstoreError::NotFound { entity: "Book", .. }));

  let err = catalog
    .update_book(
      b1.book_id,
      BookUpdate {
        price_cents: None,
        stock_quantity: Some(-1),
      },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(_)));
}

#[tokio::test]
async fn test_failed_stock_write_leaves_price_untouched() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let catalog = catalog(&store);

  store.inject_failure(FailPoint::AdjustStock);
  let err = catalog
    .update_book(
      b1.book_id,
      BookUpdate {
        price_cents: Some(2000),
        stock_quantity: Some(9),
      },
    )
    .await
    .unwrap_err();
  assert!(err.is_infrastructure());

  let stored = store.book(b1.book_id).unwrap();
  assert_eq!(stored.price_cents, 1000);
  assert_eq!(stored.stock_quantity, 5);
}

#[tokio::test]
async fn test_stock_overflow_is_reported_distinctly() {
  setup_tracing();
  let b1 = book("B1", i32::MAX - 1, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let catalog = catalog(&store);

  let err = catalog.adjust_stock(b1.book_id, 5).await.unwrap_err();
  match err {
    BookstoreError::Validation(message) => {
      assert!(message.contains("maximum stock level"), "unexpected message: {}", message);
      assert!(!message.contains("negative"));
    }
    other => panic!("expected a validation error, got {:?}", other),
  }
  assert_eq!(store.book(b1.book_id).unwrap().stock_quantity, i32::MAX - 1);

  let err = catalog.adjust_stock(b1.book_id, -i32::MAX).await.unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(ref m) if m.contains("negative")));
}

#[tokio::test]
async fn test_delete_book_removes_it_from_carts_but_not_orders() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let store = MemoryStore::with_books([b1.clone()]);
  let catalog = catalog(&store);
  let carts = carts(&store);
  let orders = order_service(&store);

  carts.add_to_cart(&user("reader"), b1.book_id, Some(2)).await.unwrap();
  let placed = orders
    .place_order(user("reader"), order_request(vec![line(&b1, 1)]))
    .await
    .unwrap();

  let deleted = catalog.delete_book(b1.book_id).await.unwrap();
  assert_eq!(deleted.book_id, b1.book_id);
  assert!(carts.cart(&user("reader")).await.unwrap().is_empty());

  let history = orders.get_order(&user("reader"), placed.order.order_id).await.unwrap();
  assert_eq!(history.items[0].title, "B1");

  let err = catalog.delete_book(b1.book_id).await.unwrap_err();
  assert!(matches!(err, BookstoreError::NotFound { .. }));
}

#[tokio::test]
async fn test_cart_add_merges_and_lists_live_book_data() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let b2 = book("B2", 1, 450);
  let store = MemoryStore::with_books([b1.clone(), b2.clone()]);
  let carts = carts(&store);
  let reader = user("reader");

  let (item, write) = carts.add_to_cart(&reader, b1.book_id, None).await.unwrap();
  assert_eq!((item.quantity, write), (1, CartWrite::Inserted));

  let (item, write) = carts.add_to_cart(&reader, b1.book_id, Some(2)).await.unwrap();
  assert_eq!((item.quantity, write), (3, CartWrite::Merged));

  carts.add_to_cart(&reader, b2.book_id, Some(1)).await.unwrap();
  carts.add_to_cart(&user("other"), b2.book_id, Some(1)).await.unwrap();

  let lines = carts.cart(&reader).await.unwrap();
  assert_eq!(lines.len(), 2);
  assert_eq!(lines[0].book_id, b1.book_id);
  assert_eq!(lines[0].quantity, 3);
  assert_eq!(lines[0].price_cents, 1000);
  assert_eq!(lines[1].stock_quantity, 1);

  let err = carts.add_to_cart(&reader, Uuid::new_v4(), Some(1)).await.unwrap_err();
  assert!(matches!(err, BookstoreError::NotFound { entity: "Book", .. }));

  let err = carts.add_to_cart(&reader, b1.book_id, Some(0)).await.unwrap_err();
  assert!(matches!(err, BookstoreError::Validation(_)));
}

#[tokio::test]
async fn test_cart_update_remove_and_clear() {
  setup_tracing();
  let b1 = book("B1", 5, 1000);
  let b2 = book("B2", 5, 450);
  let store = MemoryStore::with_books([b1.clone(), b2.clone()]);
  let carts = carts(&store);
  let reader = user("reader");

  carts.add_to_cart(&reader, b1.book_id, Some(1)).await.unwrap();
  carts.add_to_cart(&reader, b2.book_id, Some(1)).await.unwrap();

  let updated = carts.update_quantity(&reader, b1.book_id, 4).await.unwrap();
  assert_eq!(updated.quantity, 4);
  assert!(matches!(
    carts.update_quantity(&reader, b1.book_id, 0).await,
    Err(BookstoreError::Validation(_))
  ));
  assert!(matches!(
    carts.update_quantity(&user("other"), b1.book_id, 2).await,
    Err(BookstoreError::NotFound { .. })
  ));

  let removed = carts.remove_from_cart(&reader, b2.book_id).await.unwrap();
  assert_eq!(removed.book_id, b2.book_id);
  assert!(matches!(
    carts.remove_from_cart(&reader, b2.book_id).await,
    Err(BookstoreError::NotFound { .. })
  ));

  assert_eq!(carts.clear_cart(&reader).await.unwrap(), 1);
  assert_eq!(carts.clear_cart(&reader).await.unwrap(), 0);
  assert!(carts.cart(&reader).await.unwrap().is_empty());
}
