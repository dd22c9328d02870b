// core/src/error.rs
use crate::model::LineItem;
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookstoreError {
  #[error("Validation failed: {0}")]
  Validation(String),

  /// Every line item that could not be covered by the stock on hand.
  #[error("Insufficient stock for {} item(s)", .0.len())]
  InsufficientStock(Vec<LineItem>),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("Conflicting update: {0}")]
  Conflict(String),

  #[error("Data store failure during '{operation}'. Source: {source}")]
  Store {
    operation: &'static str,
    #[source]
    source: AnyhowError,
  },

  #[error("Internal bookstore error: {0}")]
  Internal(String),
}

impl BookstoreError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    BookstoreError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  /// Wraps any store-level error with the name of the operation that failed.
  pub fn store<E>(operation: &'static str, err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    BookstoreError::Store {
      operation,
      source: AnyhowError::new(err),
    }
  }

  /// True for failures of the underlying store, as opposed to business rejections.
  pub fn is_infrastructure(&self) -> bool {
    matches!(self, BookstoreError::Store { .. } | BookstoreError::Internal(_))
  }
}

impl From<AnyhowError> for BookstoreError {
  fn from(err: AnyhowError) -> Self {
    BookstoreError::Store {
      operation: "unspecified",
      source: err,
    }
  }
}

pub type BookstoreResult<T, E = BookstoreError> = std::result::Result<T, E>;
