// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bookstore::BookstoreError;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Domain(#[from] BookstoreError),

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Caller identity missing: {0}")]
  MissingCaller(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Order placement did not finish within {0:?}")]
  Timeout(Duration),
}

fn internal_error_body() -> serde_json::Value {
  json!({"error": "Internal Server Error"})
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Domain(err) => match err {
        BookstoreError::Validation(_) | BookstoreError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
        BookstoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        BookstoreError::Conflict(_) => StatusCode::CONFLICT,
        BookstoreError::Store { .. } | BookstoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Validation(_) | AppError::MissingCaller(_) => StatusCode::BAD_REQUEST,
      AppError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Sources of server-side failures are logged here and never sent back.
    if status.is_server_error() {
      tracing::error!(application_error = ?self, "Responding with server error");
    } else {
      tracing::warn!(application_error = %self, "Responding with client error");
    }

    let mut builder = HttpResponse::build(status);
    match self {
      AppError::Domain(BookstoreError::InsufficientStock(items)) => builder.json(json!({
          "error": "Insufficient stock for some items",
          "insufficientStockBooks": items
      })),
      AppError::Domain(BookstoreError::Validation(m)) | AppError::Validation(m) | AppError::MissingCaller(m) => {
        builder.json(json!({"error": m}))
      }
      AppError::Domain(err @ BookstoreError::NotFound { .. }) => builder.json(json!({"error": err.to_string()})),
      AppError::Domain(BookstoreError::Conflict(m)) => builder.json(json!({"error": m})),
      AppError::Timeout(_) => builder.json(json!({"error": "Order placement timed out, please retry"})),
      _ => builder.json(internal_error_body()),
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
