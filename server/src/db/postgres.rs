// server/src/db/postgres.rs

//! PostgreSQL implementation of the core store traits.
//!
//! Queries are checked at runtime (`sqlx::query`/`query_as`) so the crate
//! builds without a live database.

use async_trait::async_trait;
use bookstore::model::{
  Book, BookId, BookRequest, CartItem, CartLine, Order, OrderId, OrderStatus, OrderWithItems, ProfileUpdate,
  ProfileUpsert, PurchaseItem, RequestStatus, Role, UserId, UserProfile,
};
use bookstore::{
  BookEdit, BookRequestStore, BookStore, BookstoreError, BookstoreResult, CartStore, CartWrite, OrderStore,
  PlacementTx, ProfileWrite, StockAdjustment, UserStore,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

const BOOK_COLUMNS: &str = "book_id, title, author, genre, price_cents, cover_image, description, \
   publication_date, isbn, language, pages, publisher, stock_quantity, created_at";

const ORDER_COLUMNS: &str = "order_id, user_id, order_amount_cents, order_date, status, recipient_name, \
   recipient_phone, shipping_address, created_at";

const REQUEST_COLUMNS: &str = "book_id, title, author, genre, price_cents, cover_image, description, \
   publication_date, isbn, language, pages, publisher, stock_quantity, status, requested_by, created_at";

const USER_COLUMNS: &str =
  "user_id, name, email, phone, address, profile_image, dob, gender, role, created_at, updated_at";

const ITEM_COLUMNS: &str =
  "purchase_item_id, order_id, user_id, book_id, title, author, price_cents, cover_image, quantity, amount_cents";

fn store_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> BookstoreError {
  move |err| BookstoreError::store(operation, err)
}

#[derive(Clone, Debug)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    Ok(Self::new(pool))
  }

  /// Applies the migrations embedded from `server/migrations`.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await
  }
}

/// Guarded stock update shared by the transactional and standalone paths.
///
/// The sum is taken in `bigint` so an overflowing delta is reported instead of
/// failing the statement.
async fn guarded_adjust(conn: &mut PgConnection, book_id: BookId, delta: i32) -> BookstoreResult<StockAdjustment> {
  let updated: Option<i32> = sqlx::query_scalar(
    "UPDATE books SET stock_quantity = stock_quantity + $2 \
     WHERE book_id = $1 AND stock_quantity::bigint + $2 BETWEEN 0 AND 2147483647 \
     RETURNING stock_quantity",
  )
  .bind(book_id)
  .bind(delta)
  .fetch_optional(&mut *conn)
  .await
  .map_err(store_err("adjust_stock"))?;

  if let Some(level) = updated {
    return Ok(StockAdjustment::Applied(level));
  }

  let current: Option<i32> = sqlx::query_scalar("SELECT stock_quantity FROM books WHERE book_id = $1")
    .bind(book_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(store_err("adjust_stock"))?;
  Ok(match current {
    None => StockAdjustment::Missing,
    Some(level) if level.checked_add(delta).is_none() => StockAdjustment::Overflow,
    Some(_) => StockAdjustment::Refused,
  })
}

/// Inserts a catalog row; a duplicate identifier is a conflict.
async fn insert_book_row(conn: &mut PgConnection, book: &Book) -> BookstoreResult<()> {
  let result = sqlx::query(&format!(
    "INSERT INTO books ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    BOOK_COLUMNS
  ))
  .bind(book.book_id)
  .bind(&book.title)
  .bind(&book.author)
  .bind(&book.genre)
  .bind(book.price_cents)
  .bind(&book.cover_image)
  .bind(&book.description)
  .bind(book.publication_date)
  .bind(&book.isbn)
  .bind(&book.language)
  .bind(book.pages)
  .bind(&book.publisher)
  .bind(book.stock_quantity)
  .bind(book.created_at)
  .execute(&mut *conn)
  .await;

  match result {
    Ok(_) => Ok(()),
    Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(BookstoreError::Conflict(format!(
      "Book {} already exists",
      book.book_id
    ))),
    Err(e) => Err(BookstoreError::store("insert_book", e)),
  }
}

async fn attach_items(conn: &mut PgConnection, orders: Vec<Order>) -> BookstoreResult<Vec<OrderWithItems>> {
  if orders.is_empty() {
    return Ok(Vec::new());
  }
  let ids: Vec<Uuid> = orders.iter().map(|o| o.order_id).collect();
  let items: Vec<PurchaseItem> = sqlx::query_as(&format!(
    "SELECT {} FROM purchase_items WHERE order_id = ANY($1) ORDER BY line_no",
    ITEM_COLUMNS
  ))
  .bind(&ids)
  .fetch_all(&mut *conn)
  .await
  .map_err(store_err("load_purchase_items"))?;

  let mut by_order: HashMap<OrderId, Vec<PurchaseItem>> = HashMap::new();
  for item in items {
    by_order.entry(item.order_id).or_default().push(item);
  }
  Ok(
    orders
      .into_iter()
      .map(|order| {
        let items = by_order.remove(&order.order_id).unwrap_or_default();
        OrderWithItems { order, items }
      })
      .collect(),
  )
}

pub struct PgPlacementTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PlacementTx for PgPlacementTx {
  async fn lock_stock(&mut self, book_id: BookId) -> BookstoreResult<Option<i32>> {
    sqlx::query_scalar("SELECT stock_quantity FROM books WHERE book_id = $1 FOR UPDATE")
      .bind(book_id)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(store_err("lock_stock"))
  }

  async fn adjust_stock(&mut self, book_id: BookId, delta: i32) -> BookstoreResult<StockAdjustment> {
    guarded_adjust(&mut self.tx, book_id, delta).await
  }

  async fn insert_order(&mut self, order: &Order) -> BookstoreResult<()> {
    sqlx::query(&format!(
      "INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
      ORDER_COLUMNS
    ))
    .bind(order.order_id)
    .bind(&order.user_id)
    .bind(order.order_amount_cents)
    .bind(order.order_date)
    .bind(order.status)
    .bind(&order.recipient_name)
    .bind(&order.recipient_phone)
    .bind(&order.shipping_address)
    .bind(order.created_at)
    .execute(&mut *self.tx)
    .await
    .map_err(store_err("insert_order"))?;
    Ok(())
  }

  async fn insert_purchase_item(&mut self, item: &PurchaseItem) -> BookstoreResult<()> {
    sqlx::query(&format!(
      "INSERT INTO purchase_items ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
      ITEM_COLUMNS
    ))
    .bind(item.purchase_item_id)
    .bind(item.order_id)
    .bind(&item.user_id)
    .bind(item.book_id)
    .bind(&item.title)
    .bind(&item.author)
    .bind(item.price_cents)
    .bind(&item.cover_image)
    .bind(item.quantity)
    .bind(item.amount_cents)
    .execute(&mut *self.tx)
    .await
    .map_err(store_err("insert_purchase_item"))?;
    Ok(())
  }

  async fn commit(self: Box<Self>) -> BookstoreResult<()> {
    self.tx.commit().await.map_err(store_err("commit"))
  }

  async fn rollback(self: Box<Self>) -> BookstoreResult<()> {
    self.tx.rollback().await.map_err(store_err("rollback"))
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn begin(&self) -> BookstoreResult<Box<dyn PlacementTx>> {
    let tx = self.pool.begin().await.map_err(store_err("begin"))?;
    debug!("Placement transaction opened.");
    Ok(Box::new(PgPlacementTx { tx }))
  }

  #[instrument(name = "PgStore::orders_for_user", skip(self, user_id))]
  async fn orders_for_user(&self, user_id: &UserId) -> BookstoreResult<Vec<OrderWithItems>> {
    let mut conn = self.pool.acquire().await.map_err(store_err("acquire"))?;
    let orders: Vec<Order> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, order_id",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(store_err("list_orders"))?;
    attach_items(&mut conn, orders).await
  }

  async fn order_for_user(&self, user_id: &UserId, order_id: OrderId) -> BookstoreResult<Option<OrderWithItems>> {
    let mut conn = self.pool.acquire().await.map_err(store_err("acquire"))?;
    let order: Option<Order> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE order_id = $1 AND user_id = $2",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(store_err("get_order"))?;

    match order {
      None => Ok(None),
      Some(order) => Ok(attach_items(&mut conn, vec![order]).await?.pop()),
    }
  }

  async fn update_status(
    &self,
    user_id: &UserId,
    order_id: OrderId,
    status: OrderStatus,
    expected: Option<OrderStatus>,
  ) -> BookstoreResult<Option<Order>> {
    sqlx::query_as(&format!(
      "UPDATE orders SET status = $3 \
       WHERE order_id = $1 AND user_id = $2 AND ($4::order_status IS NULL OR status = $4) \
       RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(user_id)
    .bind(status)
    .bind(expected)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err("update_status"))
  }

  async fn delete_order(&self, user_id: &UserId, order_id: OrderId) -> BookstoreResult<Option<Order>> {
    // purchase_items rows go with it through ON DELETE CASCADE.
    sqlx::query_as(&format!(
      "DELETE FROM orders WHERE order_id = $1 AND user_id = $2 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err("delete_order"))
  }
}

fn like_pattern(query: &str) -> String {
  let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  format!("%{}%", escaped)
}

#[async_trait]
impl BookStore for PgStore {
  async fn list_books(&self) -> BookstoreResult<Vec<Book>> {
    sqlx::query_as(&format!("SELECT {} FROM books ORDER BY title, book_id", BOOK_COLUMNS))
      .fetch_all(&self.pool)
      .await
      .map_err(store_err("list_books"))
  }

  async fn search_books(&self, query: &str) -> BookstoreResult<Vec<Book>> {
    sqlx::query_as(&format!(
      "SELECT {} FROM books WHERE title ILIKE $1 OR author ILIKE $1 ORDER BY title, book_id",
      BOOK_COLUMNS
    ))
    .bind(like_pattern(query))
    .fetch_all(&self.pool)
    .await
    .map_err(store_err("search_books"))
  }

  async fn get_book(&self, book_id: BookId) -> BookstoreResult<Option<Book>> {
    sqlx::query_as(&format!("SELECT {} FROM books WHERE book_id = $1", BOOK_COLUMNS))
      .bind(book_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err("get_book"))
  }

  async fn insert_book(&self, book: &Book) -> BookstoreResult<()> {
    let mut conn = self.pool.acquire().await.map_err(store_err("acquire"))?;
    insert_book_row(&mut conn, book).await
  }

  #[instrument(name = "PgStore::update_book", skip(self))]
  async fn update_book(&self, book_id: BookId, price_cents: Option<i64>, stock_delta: i32) -> BookstoreResult<BookEdit> {
    let mut tx = self.pool.begin().await.map_err(store_err("begin"))?;

    let edited: Option<Book> = sqlx::query_as(&format!(
      "UPDATE books SET price_cents = COALESCE($2, price_cents) WHERE book_id = $1 RETURNING {}",
      BOOK_COLUMNS
    ))
    .bind(book_id)
    .bind(price_cents)
    .fetch_optional(&mut *tx)
    .await
    .map_err(store_err("update_book"))?;

    let Some(mut book) = edited else {
      tx.rollback().await.map_err(store_err("rollback"))?;
      return Ok(BookEdit::Missing);
    };

    if stock_delta != 0 {
      match guarded_adjust(&mut tx, book_id, stock_delta).await? {
        StockAdjustment::Applied(level) => book.stock_quantity = level,
        outcome => {
          tx.rollback().await.map_err(store_err("rollback"))?;
          debug!(%book_id, ?outcome, "Book edit rolled back.");
          return Ok(BookEdit::StockRejected(outcome));
        }
      }
    }

    tx.commit().await.map_err(store_err("commit"))?;
    Ok(BookEdit::Updated(book))
  }

  async fn adjust_stock(&self, book_id: BookId, delta: i32) -> BookstoreResult<StockAdjustment> {
    let mut conn = self.pool.acquire().await.map_err(store_err("acquire"))?;
    guarded_adjust(&mut conn, book_id, delta).await
  }

  async fn delete_book(&self, book_id: BookId) -> BookstoreResult<Option<Book>> {
    // Cart rows cascade; purchase_items keep their snapshot.
    sqlx::query_as(&format!("DELETE FROM books WHERE book_id = $1 RETURNING {}", BOOK_COLUMNS))
      .bind(book_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err("delete_book"))
  }
}

#[async_trait]
impl CartStore for PgStore {
  async fn cart_lines(&self, user_id: &UserId) -> BookstoreResult<Vec<CartLine>> {
    sqlx::query_as(
      "SELECT c.book_id, c.quantity, c.added_at, b.title, b.author, b.price_cents, b.cover_image, b.stock_quantity \
       FROM cart c JOIN books b ON b.book_id = c.book_id \
       WHERE c.user_id = $1 ORDER BY c.added_at, c.book_id",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(store_err("cart_lines"))
  }

  async fn add_to_cart(&self, user_id: &UserId, book_id: BookId, quantity: i32) -> BookstoreResult<(CartItem, CartWrite)> {
    // xmax is 0 only for a freshly inserted row.
    let row = sqlx::query(
      "INSERT INTO cart (user_id, book_id, quantity, added_at) VALUES ($1, $2, $3, now()) \
       ON CONFLICT (user_id, book_id) DO UPDATE SET quantity = cart.quantity + EXCLUDED.quantity \
       RETURNING user_id, book_id, quantity, added_at, (xmax = 0) AS inserted",
    )
    .bind(user_id)
    .bind(book_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await;

    let row = match row {
      Ok(row) => row,
      Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
        return Err(BookstoreError::not_found("Book", book_id));
      }
      Err(e) => return Err(BookstoreError::store("add_to_cart", e)),
    };

    let decode = |e: sqlx::Error| BookstoreError::store("add_to_cart", e);
    let item = CartItem {
      user_id: row.try_get("user_id").map_err(decode)?,
      book_id: row.try_get("book_id").map_err(decode)?,
      quantity: row.try_get("quantity").map_err(decode)?,
      added_at: row.try_get("added_at").map_err(decode)?,
    };
    let inserted: bool = row.try_get("inserted").map_err(decode)?;
    Ok((item, if inserted { CartWrite::Inserted } else { CartWrite::Merged }))
  }

  async fn set_quantity(&self, user_id: &UserId, book_id: BookId, quantity: i32) -> BookstoreResult<Option<CartItem>> {
    sqlx::query_as(
      "UPDATE cart SET quantity = $3 WHERE user_id = $1 AND book_id = $2 \
       RETURNING user_id, book_id, quantity, added_at",
    )
    .bind(user_id)
    .bind(book_id)
    .bind(quantity)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err("set_quantity"))
  }

  async fn remove_from_cart(&self, user_id: &UserId, book_id: BookId) -> BookstoreResult<Option<CartItem>> {
    sqlx::query_as(
      "DELETE FROM cart WHERE user_id = $1 AND book_id = $2 RETURNING user_id, book_id, quantity, added_at",
    )
    .bind(user_id)
    .bind(book_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err("remove_from_cart"))
  }

  async fn clear_cart(&self, user_id: &UserId) -> BookstoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await
      .map_err(store_err("clear_cart"))?;
    Ok(result.rows_affected())
  }
}

#[async_trait]
impl BookRequestStore for PgStore {
  async fn list_requests(&self) -> BookstoreResult<Vec<BookRequest>> {
    sqlx::query_as(&format!(
      "SELECT {} FROM book_requests ORDER BY created_at, book_id",
      REQUEST_COLUMNS
    ))
    .fetch_all(&self.pool)
    .await
    .map_err(store_err("list_requests"))
  }

  async fn insert_request(&self, request: &BookRequest) -> BookstoreResult<()> {
    let result = sqlx::query(&format!(
      "INSERT INTO book_requests ({}) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
      REQUEST_COLUMNS
    ))
    .bind(request.book_id)
    .bind(&request.title)
    .bind(&request.author)
    .bind(&request.genre)
    .bind(request.price_cents)
    .bind(&request.cover_image)
    .bind(&request.description)
    .bind(request.publication_date)
    .bind(&request.isbn)
    .bind(&request.language)
    .bind(request.pages)
    .bind(&request.publisher)
    .bind(request.stock_quantity)
    .bind(request.status)
    .bind(&request.requested_by)
    .bind(request.created_at)
    .execute(&self.pool)
    .await;

    match result {
      Ok(_) => Ok(()),
      Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(BookstoreError::Conflict(format!(
        "Book request {} already exists",
        request.book_id
      ))),
      Err(e) => Err(BookstoreError::store("insert_request", e)),
    }
  }

  #[instrument(name = "PgStore::approve_request", skip(self, now))]
  async fn approve_request(&self, book_id: BookId, now: DateTime<Utc>) -> BookstoreResult<Option<(BookRequest, Book)>> {
    let mut tx = self.pool.begin().await.map_err(store_err("begin"))?;

    let pending: Option<BookRequest> = sqlx::query_as(&format!(
      "SELECT {} FROM book_requests WHERE book_id = $1 AND status = 'pending' FOR UPDATE",
      REQUEST_COLUMNS
    ))
    .bind(book_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(store_err("lock_request"))?;

    let Some(pending) = pending else {
      tx.rollback().await.map_err(store_err("rollback"))?;
      return Ok(None);
    };

    let book = pending.to_book(now);
    // An error here drops `tx`, which rolls the whole approval back.
    insert_book_row(&mut tx, &book).await?;

    let approved: BookRequest = sqlx::query_as(&format!(
      "UPDATE book_requests SET status = $2 WHERE book_id = $1 RETURNING {}",
      REQUEST_COLUMNS
    ))
    .bind(book_id)
    .bind(RequestStatus::Approved)
    .fetch_one(&mut *tx)
    .await
    .map_err(store_err("approve_request"))?;

    tx.commit().await.map_err(store_err("commit"))?;
    debug!("Book request approved.");
    Ok(Some((approved, book)))
  }

  async fn reject_request(&self, book_id: BookId) -> BookstoreResult<Option<BookRequest>> {
    sqlx::query_as(&format!(
      "UPDATE book_requests SET status = $2 WHERE book_id = $1 AND status = 'pending' RETURNING {}",
      REQUEST_COLUMNS
    ))
    .bind(book_id)
    .bind(RequestStatus::Rejected)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err("reject_request"))
  }
}

#[async_trait]
impl UserStore for PgStore {
  async fn get_profile(&self, user_id: &UserId) -> BookstoreResult<Option<UserProfile>> {
    sqlx::query_as(&format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS))
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_err("get_profile"))
  }

  async fn upsert_profile(&self, user_id: &UserId, contact: &ProfileUpsert) -> BookstoreResult<(UserProfile, ProfileWrite)> {
    // Same insert-or-merge flag as the cart upsert.
    let row = sqlx::query(&format!(
      "INSERT INTO users (user_id, name, email, role, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, now(), now()) \
       ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email, updated_at = now() \
       RETURNING {}, (xmax = 0) AS inserted",
      USER_COLUMNS
    ))
    .bind(user_id)
    .bind(&contact.name)
    .bind(&contact.email)
    .bind(Role::Customer)
    .fetch_one(&self.pool)
    .await
    .map_err(store_err("upsert_profile"))?;

    let decode = |e: sqlx::Error| BookstoreError::store("upsert_profile", e);
    let profile = UserProfile::from_row(&row).map_err(decode)?;
    let inserted: bool = row.try_get("inserted").map_err(decode)?;
    Ok((profile, if inserted { ProfileWrite::Created } else { ProfileWrite::Updated }))
  }

  async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> BookstoreResult<Option<UserProfile>> {
    sqlx::query_as(&format!(
      "UPDATE users SET name = $2, email = $3, phone = $4, address = $5, profile_image = $6, dob = $7, \
       gender = $8, updated_at = now() WHERE user_id = $1 RETURNING {}",
      USER_COLUMNS
    ))
    .bind(user_id)
    .bind(&update.name)
    .bind(&update.email)
    .bind(&update.phone)
    .bind(&update.address)
    .bind(&update.profile_image)
    .bind(update.dob)
    .bind(update.gender)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err("update_profile"))
  }

  async fn update_role(&self, user_id: &UserId, role: Role) -> BookstoreResult<Option<UserProfile>> {
    sqlx::query_as(&format!(
      "UPDATE users SET role = $2, updated_at = now() WHERE user_id = $1 RETURNING {}",
      USER_COLUMNS
    ))
    .bind(user_id)
    .bind(role)
    .fetch_optional(&self.pool)
    .await
    .map_err(store_err("update_role"))
  }
}

#[cfg(test)]
mod tests {
  use super::like_pattern;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("rust"), "%rust%");
    assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
  }
}
