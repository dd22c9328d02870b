// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every fixture

use bookstore::model::{Book, LineItem, PlaceOrderRequest, UserId};
use bookstore::{MemoryStore, OrderService, OrderSettings};
use chrono::Utc;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Catalog fixtures ---
pub fn book(title: &str, stock_quantity: i32, price_cents: i64) -> Book {
  Book {
    book_id: Uuid::new_v4(),
    title: title.to_string(),
    author: format!("Author of {}", title),
    genre: Some("Fiction".to_string()),
    price_cents,
    cover_image: Some(format!("https://covers.example.com/{}.jpg", title.to_lowercase())),
    description: None,
    publication_date: None,
    isbn: None,
    language: Some("en".to_string()),
    pages: Some(320),
    publisher: None,
    stock_quantity,
    created_at: Utc::now(),
  }
}

pub fn line(book: &Book, quantity: i32) -> LineItem {
  LineItem {
    book_id: book.book_id,
    quantity,
    title: book.title.clone(),
    author: book.author.clone(),
    price_cents: book.price_cents,
    cover_image: book.cover_image.clone(),
  }
}

/// Checkout request whose total matches its lines.
pub fn order_request(items: Vec<LineItem>) -> PlaceOrderRequest {
  let total_amount_cents = items.iter().map(|i| i.price_cents * i64::from(i.quantity)).sum();
  PlaceOrderRequest {
    items,
    total_amount_cents,
    recipient_name: "Grace Hopper".to_string(),
    recipient_phone: "+1-555-0199".to_string(),
    shipping_address: "42 Compiler Way, Arlington, VA".to_string(),
  }
}

pub fn user(id: &str) -> UserId {
  UserId::new(id)
}

pub fn order_service(store: &MemoryStore) -> OrderService {
  order_service_with(store, OrderSettings::default())
}

pub fn order_service_with(store: &MemoryStore, settings: OrderSettings) -> OrderService {
  OrderService::new(Arc::new(store.clone()), settings)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
