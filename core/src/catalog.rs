// core/src/catalog.rs

//! Book management. Every stock change, manual or not, is a delta checked by
//! the same guard as [`BookStore::adjust_stock`], so it composes with
//! concurrent checkouts instead of overwriting them.

use crate::error::{BookstoreError, BookstoreResult};
use crate::model::{Book, BookId, BookUpdate, NewBook};
use crate::store::{BookEdit, BookStore, StockAdjustment};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct CatalogService {
  store: Arc<dyn BookStore>,
}

impl CatalogService {
  pub fn new(store: Arc<dyn BookStore>) -> Self {
    Self { store }
  }

  pub async fn list_books(&self) -> BookstoreResult<Vec<Book>> {
    self.store.list_books().await
  }

  pub async fn search_books(&self, query: &str) -> BookstoreResult<Vec<Book>> {
    let query = query.trim();
    if query.is_empty() {
      return self.store.list_books().await;
    }
    self.store.search_books(query).await
  }

  pub async fn get_book(&self, book_id: BookId) -> BookstoreResult<Book> {
    self
      .store
      .get_book(book_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("Book", book_id))
  }

  #[instrument(name = "CatalogService::create_book", skip_all, fields(title = %new_book.title))]
  pub async fn create_book(&self, new_book: NewBook) -> BookstoreResult<Book> {
    new_book.validate()?;
    let book = new_book.into_book(Utc::now());
    self.store.insert_book(&book).await?;
    info!(book_id = %book.book_id, "Book created.");
    Ok(book)
  }

  /// Applies a price and/or stock update as one write.
  ///
  /// A target stock level is turned into a delta against the level read just
  /// before, so units sold in between stay sold. If the delta is refused the
  /// price is left untouched as well.
  #[instrument(name = "CatalogService::update_book", skip(self))]
  pub async fn update_book(&self, book_id: BookId, update: BookUpdate) -> BookstoreResult<Book> {
    update.validate()?;
    if update.is_empty() {
      return Err(BookstoreError::Validation("Nothing to update: send price_cents and/or stock_quantity.".to_string()));
    }
    let current = self.get_book(book_id).await?;
    let delta = match update.stock_quantity {
      Some(target) => target - current.stock_quantity,
      None => 0,
    };

    match self.store.update_book(book_id, update.price_cents, delta).await? {
      BookEdit::Updated(book) => {
        info!(%book_id, delta, level = book.stock_quantity, price_cents = book.price_cents, "Book updated.");
        Ok(book)
      }
      BookEdit::StockRejected(outcome) => Err(rejected_delta(book_id, delta, outcome)),
      BookEdit::Missing => Err(BookstoreError::not_found("Book", book_id)),
    }
  }

  /// Guarded manual restock (positive delta) or write-off (negative delta).
  #[instrument(name = "CatalogService::adjust_stock", skip(self))]
  pub async fn adjust_stock(&self, book_id: BookId, delta: i32) -> BookstoreResult<Book> {
    match self.store.adjust_stock(book_id, delta).await? {
      StockAdjustment::Applied(level) => info!(%book_id, delta, level, "Stock adjusted."),
      StockAdjustment::Missing => return Err(BookstoreError::not_found("Book", book_id)),
      outcome => return Err(rejected_delta(book_id, delta, outcome)),
    }
    self.get_book(book_id).await
  }

  #[instrument(name = "CatalogService::delete_book", skip(self))]
  pub async fn delete_book(&self, book_id: BookId) -> BookstoreResult<Book> {
    self
      .store
      .delete_book(book_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("Book", book_id))
  }
}

fn rejected_delta(book_id: BookId, delta: i32, outcome: StockAdjustment) -> BookstoreError {
  warn!(%book_id, delta, ?outcome, "Stock adjustment refused.");
  let reason = match outcome {
    StockAdjustment::Overflow => "exceed the maximum stock level",
    _ => "make it negative",
  };
  BookstoreError::Validation(format!("Adjusting stock of book {} by {} would {}.", book_id, delta, reason))
}
