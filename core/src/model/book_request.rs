// core/src/model/book_request.rs

//! Catalog submissions waiting for review. A request carries the identifier
//! the book will have once it is approved.

use super::book::{Book, BookId, NewBook};
use super::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "request_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  Pending,
  Approved,
  Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookRequest {
  pub book_id: BookId,
  pub title: String,
  pub author: String,
  pub genre: Option<String>,
  pub price_cents: i64,
  pub cover_image: Option<String>,
  pub description: Option<String>,
  pub publication_date: Option<NaiveDate>,
  pub isbn: Option<String>,
  pub language: Option<String>,
  pub pages: Option<i32>,
  pub publisher: Option<String>,
  pub stock_quantity: i32,
  pub status: RequestStatus,
  pub requested_by: UserId,
  pub created_at: DateTime<Utc>,
}

impl BookRequest {
  /// Builds a pending request from a submission. Call [`NewBook::validate`] first.
  pub fn pending(submission: NewBook, requested_by: UserId, now: DateTime<Utc>) -> Self {
    BookRequest {
      book_id: Uuid::new_v4(),
      title: submission.title,
      author: submission.author,
      genre: submission.genre,
      price_cents: submission.price_cents,
      cover_image: submission.cover_image,
      description: submission.description,
      publication_date: submission.publication_date,
      isbn: submission.isbn,
      language: submission.language,
      pages: submission.pages,
      publisher: submission.publisher,
      stock_quantity: submission.stock_quantity,
      status: RequestStatus::Pending,
      requested_by,
      created_at: now,
    }
  }

  /// The catalog row an approval publishes, under the request's own identifier.
  pub fn to_book(&self, now: DateTime<Utc>) -> Book {
    Book {
      book_id: self.book_id,
      title: self.title.clone(),
      author: self.author.clone(),
      genre: self.genre.clone(),
      price_cents: self.price_cents,
      cover_image: self.cover_image.clone(),
      description: self.description.clone(),
      publication_date: self.publication_date,
      isbn: self.isbn.clone(),
      language: self.language.clone(),
      pages: self.pages,
      publisher: self.publisher.clone(),
      stock_quantity: self.stock_quantity,
      created_at: now,
    }
  }
}
