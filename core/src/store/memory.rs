// core/src/store/memory.rs

//! In-process implementation of every store trait.
//!
//! All writers (transactions included) queue on one async writer lock, so a
//! transaction sees a stable copy of the tables for its whole lifetime and
//! publishes it atomically on commit. Readers never wait for the writer lock;
//! they observe the last committed state.

use super::{
  BookEdit, BookRequestStore, BookStore, CartStore, CartWrite, OrderStore, PlacementTx, ProfileWrite, StockAdjustment,
  UserStore,
};
use crate::error::{BookstoreError, BookstoreResult};
use crate::model::{
  Book, BookId, BookRequest, CartItem, CartLine, Order, OrderId, OrderStatus, OrderWithItems, ProfileUpdate,
  ProfileUpsert, PurchaseItem, RequestStatus, Role, UserId, UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, trace};

/// Store operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
  Begin,
  LockStock,
  AdjustStock,
  InsertOrder,
  InsertPurchaseItem,
  InsertBook,
  Commit,
}

impl FailPoint {
  fn operation(self) -> &'static str {
    match self {
      FailPoint::Begin => "begin",
      FailPoint::LockStock => "lock_stock",
      FailPoint::AdjustStock => "adjust_stock",
      FailPoint::InsertOrder => "insert_order",
      FailPoint::InsertPurchaseItem => "insert_purchase_item",
      FailPoint::InsertBook => "insert_book",
      FailPoint::Commit => "commit",
    }
  }
}

#[derive(Debug, Default, Clone)]
struct Tables {
  books: HashMap<BookId, Book>,
  orders: Vec<Order>, // insertion order
  purchase_items: Vec<PurchaseItem>,
  carts: Vec<CartItem>,
  requests: Vec<BookRequest>, // submission order
  users: HashMap<UserId, UserProfile>,
}

impl Tables {
  fn guarded_adjust(&mut self, book_id: BookId, delta: i32) -> StockAdjustment {
    match self.books.get_mut(&book_id) {
      None => StockAdjustment::Missing,
      Some(book) => match book.stock_quantity.checked_add(delta) {
        Some(next) if next >= 0 => {
          book.stock_quantity = next;
          StockAdjustment::Applied(next)
        }
        Some(_) => StockAdjustment::Refused,
        None => StockAdjustment::Overflow,
      },
    }
  }

  fn with_items(&self, order: &Order) -> OrderWithItems {
    OrderWithItems {
      order: order.clone(),
      items: self
        .purchase_items
        .iter()
        .filter(|item| item.order_id == order.order_id)
        .cloned()
        .collect(),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables: Arc<RwLock<Tables>>,
  writer: Arc<AsyncMutex<()>>,
  failure: Arc<Mutex<Option<FailPoint>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds a store whose catalog already holds `books`.
  pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
    let store = Self::new();
    {
      let mut tables = store.tables.write();
      for book in books {
        tables.books.insert(book.book_id, book);
      }
    }
    store
  }

  /// Makes the next store call reaching `point` fail with a store error.
  /// The fail point is consumed by that call.
  pub fn inject_failure(&self, point: FailPoint) {
    *self.failure.lock() = Some(point);
  }

  pub fn book(&self, book_id: BookId) -> Option<Book> {
    self.tables.read().books.get(&book_id).cloned()
  }

  pub fn order_count(&self) -> usize {
    self.tables.read().orders.len()
  }

  pub fn purchase_item_count(&self) -> usize {
    self.tables.read().purchase_items.len()
  }

  pub fn request(&self, book_id: BookId) -> Option<BookRequest> {
    self.tables.read().requests.iter().find(|r| r.book_id == book_id).cloned()
  }

  fn trip(failure: &Mutex<Option<FailPoint>>, point: FailPoint) -> BookstoreResult<()> {
    let mut armed = failure.lock();
    if *armed == Some(point) {
      *armed = None;
      debug!(fail_point = ?point, "Injected store failure triggered.");
      return Err(BookstoreError::Store {
        operation: point.operation(),
        source: anyhow::anyhow!("injected failure at {}", point.operation()),
      });
    }
    Ok(())
  }
}

struct MemoryTx {
  _writer: OwnedMutexGuard<()>,
  staged: Tables,
  tables: Arc<RwLock<Tables>>,
  failure: Arc<Mutex<Option<FailPoint>>>,
}

#[async_trait]
impl PlacementTx for MemoryTx {
  async fn lock_stock(&mut self, book_id: BookId) -> BookstoreResult<Option<i32>> {
    MemoryStore::trip(&self.failure, FailPoint::LockStock)?;
    Ok(self.staged.books.get(&book_id).map(|book| book.stock_quantity))
  }

  async fn adjust_stock(&mut self, book_id: BookId, delta: i32) -> BookstoreResult<StockAdjustment> {
    MemoryStore::trip(&self.failure, FailPoint::AdjustStock)?;
    Ok(self.staged.guarded_adjust(book_id, delta))
  }

  async fn insert_order(&mut self, order: &Order) -> BookstoreResult<()> {
    MemoryStore::trip(&self.failure, FailPoint::InsertOrder)?;
    self.staged.orders.push(order.clone());
    Ok(())
  }

  async fn insert_purchase_item(&mut self, item: &PurchaseItem) -> BookstoreResult<()> {
    MemoryStore::trip(&self.failure, FailPoint::InsertPurchaseItem)?;
    self.staged.purchase_items.push(item.clone());
    Ok(())
  }

  async fn commit(self: Box<Self>) -> BookstoreResult<()> {
    MemoryStore::trip(&self.failure, FailPoint::Commit)?;
    let MemoryTx { _writer, staged, tables, .. } = *self;
    *tables.write() = staged;
    trace!("In-memory transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> BookstoreResult<()> {
    trace!("In-memory transaction rolled back.");
    Ok(())
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn begin(&self) -> BookstoreResult<Box<dyn PlacementTx>> {
    MemoryStore::trip(&self.failure, FailPoint::Begin)?;
    let writer = Arc::clone(&self.writer).lock_owned().await;
    let staged = self.tables.read().clone();
    Ok(Box::new(MemoryTx {
      _writer: writer,
      staged,
      tables: Arc::clone(&self.tables),
      failure: Arc::clone(&self.failure),
    }))
  }

  async fn orders_for_user(&self, user_id: &UserId) -> BookstoreResult<Vec<OrderWithItems>> {
    let tables = self.tables.read();
    let mut orders: Vec<&Order> = tables.orders.iter().rev().filter(|o| &o.user_id == user_id).collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders.into_iter().map(|o| tables.with_items(o)).collect())
  }

  async fn order_for_user(&self, user_id: &UserId, order_id: OrderId) -> BookstoreResult<Option<OrderWithItems>> {
    let tables = self.tables.read();
    Ok(
      tables
        .orders
        .iter()
        .find(|o| o.order_id == order_id && &o.user_id == user_id)
        .map(|o| tables.with_items(o)),
    )
  }

  async fn update_status(
    &self,
    user_id: &UserId,
    order_id: OrderId,
    status: OrderStatus,
    expected: Option<OrderStatus>,
  ) -> BookstoreResult<Option<Order>> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    let found = tables
      .orders
      .iter_mut()
      .find(|o| o.order_id == order_id && &o.user_id == user_id && expected.map_or(true, |e| o.status == e));
    Ok(found.map(|order| {
      order.status = status;
      order.clone()
    }))
  }

  async fn delete_order(&self, user_id: &UserId, order_id: OrderId) -> BookstoreResult<Option<Order>> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    let Some(pos) = tables.orders.iter().position(|o| o.order_id == order_id && &o.user_id == user_id) else {
      return Ok(None);
    };
    let removed = tables.orders.remove(pos);
    tables.purchase_items.retain(|item| item.order_id != order_id);
    Ok(Some(removed))
  }
}

#[async_trait]
impl BookStore for MemoryStore {
  async fn list_books(&self) -> BookstoreResult<Vec<Book>> {
    let mut books: Vec<Book> = self.tables.read().books.values().cloned().collect();
    books.sort_by(|a, b| a.title.cmp(&b.title).then(a.book_id.cmp(&b.book_id)));
    Ok(books)
  }

  async fn search_books(&self, query: &str) -> BookstoreResult<Vec<Book>> {
    let needle = query.to_lowercase();
    let mut books = self.list_books().await?;
    books.retain(|b| b.title.to_lowercase().contains(&needle) || b.author.to_lowercase().contains(&needle));
    Ok(books)
  }

  async fn get_book(&self, book_id: BookId) -> BookstoreResult<Option<Book>> {
    Ok(self.book(book_id))
  }

  async fn insert_book(&self, book: &Book) -> BookstoreResult<()> {
    MemoryStore::trip(&self.failure, FailPoint::InsertBook)?;
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    if tables.books.contains_key(&book.book_id) {
      return Err(BookstoreError::Conflict(format!("Book {} already exists", book.book_id)));
    }
    tables.books.insert(book.book_id, book.clone());
    Ok(())
  }

  async fn update_book(&self, book_id: BookId, price_cents: Option<i64>, stock_delta: i32) -> BookstoreResult<BookEdit> {
    let _writer = self.writer.lock().await;
    let Some(mut edited) = self.book(book_id) else {
      return Ok(BookEdit::Missing);
    };
    if let Some(price_cents) = price_cents {
      edited.price_cents = price_cents;
    }
    if stock_delta != 0 {
      MemoryStore::trip(&self.failure, FailPoint::AdjustStock)?;
      match edited.stock_quantity.checked_add(stock_delta) {
        Some(next) if next >= 0 => edited.stock_quantity = next,
        Some(_) => return Ok(BookEdit::StockRejected(StockAdjustment::Refused)),
        None => return Ok(BookEdit::StockRejected(StockAdjustment::Overflow)),
      }
    }
    // Published only once every part of the edit succeeded.
    self.tables.write().books.insert(book_id, edited.clone());
    Ok(BookEdit::Updated(edited))
  }

  async fn adjust_stock(&self, book_id: BookId, delta: i32) -> BookstoreResult<StockAdjustment> {
    MemoryStore::trip(&self.failure, FailPoint::AdjustStock)?;
    let _writer = self.writer.lock().await;
    let outcome = self.tables.write().guarded_adjust(book_id, delta);
    Ok(outcome)
  }

  async fn delete_book(&self, book_id: BookId) -> BookstoreResult<Option<Book>> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    let removed = tables.books.remove(&book_id);
    if removed.is_some() {
      tables.carts.retain(|item| item.book_id != book_id);
    }
    Ok(removed)
  }
}

#[async_trait]
impl CartStore for MemoryStore {
  async fn cart_lines(&self, user_id: &UserId) -> BookstoreResult<Vec<CartLine>> {
    let tables = self.tables.read();
    Ok(
      tables
        .carts
        .iter()
        .filter(|item| &item.user_id == user_id)
        .filter_map(|item| {
          tables.books.get(&item.book_id).map(|book| CartLine {
            book_id: item.book_id,
            quantity: item.quantity,
            added_at: item.added_at,
            title: book.title.clone(),
            author: book.author.clone(),
            price_cents: book.price_cents,
            cover_image: book.cover_image.clone(),
            stock_quantity: book.stock_quantity,
          })
        })
        .collect(),
    )
  }

  async fn add_to_cart(&self, user_id: &UserId, book_id: BookId, quantity: i32) -> BookstoreResult<(CartItem, CartWrite)> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    if !tables.books.contains_key(&book_id) {
      return Err(BookstoreError::not_found("Book", book_id));
    }
    if let Some(existing) = tables.carts.iter_mut().find(|i| &i.user_id == user_id && i.book_id == book_id) {
      existing.quantity = existing.quantity.saturating_add(quantity);
      return Ok((existing.clone(), CartWrite::Merged));
    }
    let item = CartItem {
      user_id: user_id.clone(),
      book_id,
      quantity,
      added_at: Utc::now(),
    };
    tables.carts.push(item.clone());
    Ok((item, CartWrite::Inserted))
  }

  async fn set_quantity(&self, user_id: &UserId, book_id: BookId, quantity: i32) -> BookstoreResult<Option<CartItem>> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    Ok(
      tables
        .carts
        .iter_mut()
        .find(|i| &i.user_id == user_id && i.book_id == book_id)
        .map(|item| {
          item.quantity = quantity;
          item.clone()
        }),
    )
  }

  async fn remove_from_cart(&self, user_id: &UserId, book_id: BookId) -> BookstoreResult<Option<CartItem>> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    let pos = tables.carts.iter().position(|i| &i.user_id == user_id && i.book_id == book_id);
    Ok(pos.map(|p| tables.carts.remove(p)))
  }

  async fn clear_cart(&self, user_id: &UserId) -> BookstoreResult<u64> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    let before = tables.carts.len();
    tables.carts.retain(|i| &i.user_id != user_id);
    Ok((before - tables.carts.len()) as u64)
  }
}

#[async_trait]
impl BookRequestStore for MemoryStore {
  async fn list_requests(&self) -> BookstoreResult<Vec<BookRequest>> {
    Ok(self.tables.read().requests.clone())
  }

  async fn insert_request(&self, request: &BookRequest) -> BookstoreResult<()> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    if tables.requests.iter().any(|r| r.book_id == request.book_id) {
      return Err(BookstoreError::Conflict(format!("Book request {} already exists", request.book_id)));
    }
    tables.requests.push(request.clone());
    Ok(())
  }

  async fn approve_request(&self, book_id: BookId, now: DateTime<Utc>) -> BookstoreResult<Option<(BookRequest, Book)>> {
    let _writer = self.writer.lock().await;
    let pending = self
      .tables
      .read()
      .requests
      .iter()
      .find(|r| r.book_id == book_id && r.status == RequestStatus::Pending)
      .cloned();
    let Some(mut request) = pending else {
      return Ok(None);
    };

    let book = request.to_book(now);
    request.status = RequestStatus::Approved;
    MemoryStore::trip(&self.failure, FailPoint::InsertBook)?;

    let mut tables = self.tables.write();
    if tables.books.contains_key(&book_id) {
      return Err(BookstoreError::Conflict(format!("Book {} already exists", book_id)));
    }
    tables.books.insert(book_id, book.clone());
    if let Some(stored) = tables.requests.iter_mut().find(|r| r.book_id == book_id) {
      stored.status = RequestStatus::Approved;
    }
    Ok(Some((request, book)))
  }

  async fn reject_request(&self, book_id: BookId) -> BookstoreResult<Option<BookRequest>> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    Ok(
      tables
        .requests
        .iter_mut()
        .find(|r| r.book_id == book_id && r.status == RequestStatus::Pending)
        .map(|request| {
          request.status = RequestStatus::Rejected;
          request.clone()
        }),
    )
  }
}

#[async_trait]
impl UserStore for MemoryStore {
  async fn get_profile(&self, user_id: &UserId) -> BookstoreResult<Option<UserProfile>> {
    Ok(self.tables.read().users.get(user_id).cloned())
  }

  async fn upsert_profile(&self, user_id: &UserId, contact: &ProfileUpsert) -> BookstoreResult<(UserProfile, ProfileWrite)> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    let now = Utc::now();
    if let Some(existing) = tables.users.get_mut(user_id) {
      existing.name = contact.name.clone();
      existing.email = contact.email.clone();
      existing.updated_at = now;
      return Ok((existing.clone(), ProfileWrite::Updated));
    }
    let profile = UserProfile {
      user_id: user_id.clone(),
      name: contact.name.clone(),
      email: contact.email.clone(),
      phone: None,
      address: None,
      profile_image: None,
      dob: None,
      gender: None,
      role: Role::Customer,
      created_at: now,
      updated_at: now,
    };
    tables.users.insert(user_id.clone(), profile.clone());
    Ok((profile, ProfileWrite::Created))
  }

  async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> BookstoreResult<Option<UserProfile>> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    Ok(tables.users.get_mut(user_id).map(|profile| {
      profile.name = update.name.clone();
      profile.email = update.email.clone();
      profile.phone = update.phone.clone();
      profile.address = update.address.clone();
      profile.profile_image = update.profile_image.clone();
      profile.dob = update.dob;
      profile.gender = update.gender;
      profile.updated_at = Utc::now();
      profile.clone()
    }))
  }

  async fn update_role(&self, user_id: &UserId, role: Role) -> BookstoreResult<Option<UserProfile>> {
    let _writer = self.writer.lock().await;
    let mut tables = self.tables.write();
    Ok(tables.users.get_mut(user_id).map(|profile| {
      profile.role = role;
      profile.updated_at = Utc::now();
      profile.clone()
    }))
  }
}
