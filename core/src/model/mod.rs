// core/src/model/mod.rs

//! Data structures shared by the placement engine, the services and the stores.

pub mod book;
pub mod book_request;
pub mod cart;
pub mod order;
pub mod user;

pub use book::{Book, BookId, BookUpdate, NewBook};
pub use book_request::{BookRequest, RequestStatus};
pub use cart::{CartItem, CartLine};
pub use order::{LineItem, Order, OrderId, OrderStatus, OrderWithItems, PlaceOrderRequest, PurchaseItem};
pub use user::{Gender, ProfileUpdate, ProfileUpsert, Role, UserProfile};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque caller identifier handed over by the upstream gateway.
///
/// It is never authenticated here and is recorded exactly as received,
/// including the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
  pub fn new(raw: impl Into<String>) -> Self {
    UserId(raw.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for UserId {
  fn from(raw: &str) -> Self {
    UserId(raw.to_string())
  }
}
