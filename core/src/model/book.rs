// core/src/model/book.rs

use crate::error::{BookstoreError, BookstoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BookId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
  pub book_id: BookId,
  pub title: String,
  pub author: String,
  pub genre: Option<String>,
  pub price_cents: i64,
  pub cover_image: Option<String>, // URL handed out by the blob store
  pub description: Option<String>,
  pub publication_date: Option<NaiveDate>,
  pub isbn: Option<String>,
  pub language: Option<String>,
  pub pages: Option<i32>,
  pub publisher: Option<String>,
  pub stock_quantity: i32,
  pub created_at: DateTime<Utc>,
}

/// Request body for creating a catalog entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBook {
  pub title: String,
  pub author: String,
  #[serde(default)]
  pub genre: Option<String>,
  pub price_cents: i64,
  #[serde(default)]
  pub cover_image: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub publication_date: Option<NaiveDate>,
  #[serde(default)]
  pub isbn: Option<String>,
  #[serde(default)]
  pub language: Option<String>,
  #[serde(default)]
  pub pages: Option<i32>,
  #[serde(default)]
  pub publisher: Option<String>,
  #[serde(default)]
  pub stock_quantity: i32,
}

impl NewBook {
  pub fn validate(&self) -> BookstoreResult<()> {
    if self.title.trim().is_empty() {
      return Err(BookstoreError::Validation("Book title must not be empty.".to_string()));
    }
    if self.author.trim().is_empty() {
      return Err(BookstoreError::Validation("Book author must not be empty.".to_string()));
    }
    if self.price_cents < 0 {
      return Err(BookstoreError::Validation("Book price must not be negative.".to_string()));
    }
    if self.stock_quantity < 0 {
      return Err(BookstoreError::Validation("Stock quantity must not be negative.".to_string()));
    }
    if matches!(self.pages, Some(p) if p <= 0) {
      return Err(BookstoreError::Validation("Page count must be positive.".to_string()));
    }
    Ok(())
  }

  /// Materializes the catalog row with a freshly generated identifier.
  pub fn into_book(self, now: DateTime<Utc>) -> Book {
    Book {
      book_id: Uuid::new_v4(),
      title: self.title,
      author: self.author,
      genre: self.genre,
      price_cents: self.price_cents,
      cover_image: self.cover_image,
      description: self.description,
      publication_date: self.publication_date,
      isbn: self.isbn,
      language: self.language,
      pages: self.pages,
      publisher: self.publisher,
      stock_quantity: self.stock_quantity,
      created_at: now,
    }
  }
}

/// Partial update. Only price and stock are editable after creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookUpdate {
  #[serde(default)]
  pub price_cents: Option<i64>,
  #[serde(default)]
  pub stock_quantity: Option<i32>,
}

impl BookUpdate {
  pub fn validate(&self) -> BookstoreResult<()> {
    if matches!(self.price_cents, Some(p) if p < 0) {
      return Err(BookstoreError::Validation("Book price must not be negative.".to_string()));
    }
    if matches!(self.stock_quantity, Some(q) if q < 0) {
      return Err(BookstoreError::Validation("Stock quantity must not be negative.".to_string()));
    }
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.price_cents.is_none() && self.stock_quantity.is_none()
  }
}
