// core/src/store/mod.rs

//! Store abstractions the services run against.
//!
//! The traits are object-safe so the HTTP layer can hold `Arc<dyn ...>` and
//! swap PostgreSQL for [`MemoryStore`] in tests. Every method is a single
//! round trip to the backing store; business rules live in the services.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::BookstoreResult;
use crate::model::{
  Book, BookId, BookRequest, CartItem, CartLine, Order, OrderId, OrderStatus, OrderWithItems, ProfileUpdate,
  ProfileUpsert, PurchaseItem, Role, UserId, UserProfile,
};
use chrono::{DateTime, Utc};
use async_trait::async_trait;

/// Outcome of the guarded stock primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
  /// The delta was applied; carries the new stock level.
  Applied(i32),
  /// Applying the delta would have driven stock negative. Nothing changed.
  Refused,
  /// The new level would not fit the stock column. Nothing changed.
  Overflow,
  /// No book with that identifier.
  Missing,
}

/// Outcome of [`BookStore::update_book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookEdit {
  Updated(Book),
  /// The stock guard said no (`Refused` or `Overflow`); the price was not written either.
  StockRejected(StockAdjustment),
  Missing,
}

/// A unit of work opened by [`OrderStore::begin`].
///
/// Dropping a transaction without calling [`commit`](PlacementTx::commit)
/// must discard all of its writes.
#[async_trait]
pub trait PlacementTx: Send {
  /// Reads the stock of a book and holds it against concurrent writers until
  /// the transaction ends. `None` if the book does not exist.
  async fn lock_stock(&mut self, book_id: BookId) -> BookstoreResult<Option<i32>>;

  /// Guarded stock update: applies `delta` only if the result stays non-negative.
  async fn adjust_stock(&mut self, book_id: BookId, delta: i32) -> BookstoreResult<StockAdjustment>;

  async fn insert_order(&mut self, order: &Order) -> BookstoreResult<()>;

  async fn insert_purchase_item(&mut self, item: &PurchaseItem) -> BookstoreResult<()>;

  async fn commit(self: Box<Self>) -> BookstoreResult<()>;

  async fn rollback(self: Box<Self>) -> BookstoreResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn begin(&self) -> BookstoreResult<Box<dyn PlacementTx>>;

  /// All orders owned by `user_id` with their lines, newest first.
  async fn orders_for_user(&self, user_id: &UserId) -> BookstoreResult<Vec<OrderWithItems>>;

  async fn order_for_user(&self, user_id: &UserId, order_id: OrderId) -> BookstoreResult<Option<OrderWithItems>>;

  /// Overwrites the status. When `expected` is set the write only happens if
  /// the stored status still equals it. Returns `None` if nothing matched.
  async fn update_status(
    &self,
    user_id: &UserId,
    order_id: OrderId,
    status: OrderStatus,
    expected: Option<OrderStatus>,
  ) -> BookstoreResult<Option<Order>>;

  /// Removes the order and its lines. Stock is left untouched.
  async fn delete_order(&self, user_id: &UserId, order_id: OrderId) -> BookstoreResult<Option<Order>>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
  async fn list_books(&self) -> BookstoreResult<Vec<Book>>;

  /// Case-insensitive substring match on title or author.
  async fn search_books(&self, query: &str) -> BookstoreResult<Vec<Book>>;

  async fn get_book(&self, book_id: BookId) -> BookstoreResult<Option<Book>>;

  async fn insert_book(&self, book: &Book) -> BookstoreResult<()>;

  /// Writes an optional new price and a stock delta as one unit: either both
  /// land or neither does. The delta goes through the same guard as
  /// [`adjust_stock`](BookStore::adjust_stock); a zero delta leaves stock alone.
  async fn update_book(&self, book_id: BookId, price_cents: Option<i64>, stock_delta: i32) -> BookstoreResult<BookEdit>;

  /// The same guarded primitive the placement engine uses, outside a transaction.
  async fn adjust_stock(&self, book_id: BookId, delta: i32) -> BookstoreResult<StockAdjustment>;

  async fn delete_book(&self, book_id: BookId) -> BookstoreResult<Option<Book>>;
}

/// Whether [`CartStore::add_to_cart`] merged into an existing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartWrite {
  Inserted,
  Merged,
}

#[async_trait]
pub trait CartStore: Send + Sync {
  async fn cart_lines(&self, user_id: &UserId) -> BookstoreResult<Vec<CartLine>>;

  /// Adds `quantity` to the existing line, or inserts a new one.
  async fn add_to_cart(&self, user_id: &UserId, book_id: BookId, quantity: i32) -> BookstoreResult<(CartItem, CartWrite)>;

  async fn set_quantity(&self, user_id: &UserId, book_id: BookId, quantity: i32) -> BookstoreResult<Option<CartItem>>;

  async fn remove_from_cart(&self, user_id: &UserId, book_id: BookId) -> BookstoreResult<Option<CartItem>>;

  /// Returns the number of removed lines.
  async fn clear_cart(&self, user_id: &UserId) -> BookstoreResult<u64>;
}

#[async_trait]
pub trait BookRequestStore: Send + Sync {
  /// Every request regardless of status, oldest first.
  async fn list_requests(&self) -> BookstoreResult<Vec<BookRequest>>;

  async fn insert_request(&self, request: &BookRequest) -> BookstoreResult<()>;

  /// Publishes a pending request as a catalog book and marks it approved, as
  /// one unit of work. `None` if there is no pending request with that id.
  async fn approve_request(&self, book_id: BookId, now: DateTime<Utc>) -> BookstoreResult<Option<(BookRequest, Book)>>;

  /// Marks a pending request rejected. `None` if there is no pending request with that id.
  async fn reject_request(&self, book_id: BookId) -> BookstoreResult<Option<BookRequest>>;
}

/// Whether [`UserStore::upsert_profile`] created the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileWrite {
  Created,
  Updated,
}

#[async_trait]
pub trait UserStore: Send + Sync {
  async fn get_profile(&self, user_id: &UserId) -> BookstoreResult<Option<UserProfile>>;

  /// Creates a customer profile, or overwrites name and email of an existing one.
  async fn upsert_profile(&self, user_id: &UserId, contact: &ProfileUpsert) -> BookstoreResult<(UserProfile, ProfileWrite)>;

  async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> BookstoreResult<Option<UserProfile>>;

  async fn update_role(&self, user_id: &UserId, role: Role) -> BookstoreResult<Option<UserProfile>>;
}
