// core/src/model/cart.rs

use super::book::BookId;
use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One (user, book) row of a shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
  pub user_id: UserId,
  pub book_id: BookId,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// Cart row joined with the live catalog entry it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
  pub book_id: BookId,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
  pub title: String,
  pub author: String,
  pub price_cents: i64,
  pub cover_image: Option<String>,
  pub stock_quantity: i32,
}
