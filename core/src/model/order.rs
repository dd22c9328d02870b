// core/src/model/order.rs

use super::book::BookId;
use super::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type OrderId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "order_status"))]
pub enum OrderStatus {
  Processing,
  Shipped,
  Delivered,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Processing => "Processing",
      OrderStatus::Shipped => "Shipped",
      OrderStatus::Delivered => "Delivered",
    }
  }

  /// Transition table used when strict status handling is switched on.
  /// Re-asserting the current status is always allowed.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Processing, Processing)
        | (Processing, Shipped)
        | (Processing, Delivered)
        | (Shipped, Shipped)
        | (Shipped, Delivered)
        | (Delivered, Delivered)
    )
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "Processing" => Ok(OrderStatus::Processing),
      "Shipped" => Ok(OrderStatus::Shipped),
      "Delivered" => Ok(OrderStatus::Delivered),
      other => Err(format!("Unknown order status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
  pub order_id: OrderId,
  pub user_id: UserId,
  pub order_amount_cents: i64,
  pub order_date: NaiveDate,
  pub status: OrderStatus,
  pub recipient_name: String,
  pub recipient_phone: String,
  pub shipping_address: String,
  pub created_at: DateTime<Utc>,
}

/// Order line as recorded at purchase time. Later catalog edits do not touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseItem {
  pub purchase_item_id: Uuid,
  pub order_id: OrderId,
  pub user_id: UserId,
  pub book_id: BookId,
  pub title: String,
  pub author: String,
  pub price_cents: i64,
  pub cover_image: Option<String>,
  pub quantity: i32,
  pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<PurchaseItem>,
}

/// One requested line of a checkout, as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
  pub book_id: BookId,
  pub quantity: i32,
  pub title: String,
  pub author: String,
  pub price_cents: i64,
  #[serde(default)]
  pub cover_image: Option<String>,
}

impl LineItem {
  /// `price_cents * quantity`, or `None` on overflow.
  pub fn amount_cents(&self) -> Option<i64> {
    self.price_cents.checked_mul(i64::from(self.quantity))
  }
}

#[cfg(test)]
impl LineItem {
  pub(crate) fn sample() -> Self {
    LineItem {
      book_id: Uuid::new_v4(),
      quantity: 1,
      title: "Sample".to_string(),
      author: "Anonymous".to_string(),
      price_cents: 1000,
      cover_image: None,
    }
  }
}

/// Checkout request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
  pub items: Vec<LineItem>,
  pub total_amount_cents: i64,
  pub recipient_name: String,
  pub recipient_phone: String,
  pub shipping_address: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_round_trips_through_text() {
    for status in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
      assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
    }
    assert!("Cancelled".parse::<OrderStatus>().is_err());
  }

  #[test]
  fn transition_table_forbids_moving_backwards() {
    assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
    assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Delivered));
    assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Processing));
    assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
  }

  #[test]
  fn line_amount_detects_overflow() {
    let mut item = LineItem::sample();
    item.quantity = 3;
    assert_eq!(item.amount_cents(), Some(3000));
    item.price_cents = i64::MAX;
    assert_eq!(item.amount_cents(), None);
  }

  #[test]
  fn order_with_items_serializes_flat() {
    let order = Order {
      order_id: Uuid::nil(),
      user_id: UserId::from("u-1"),
      order_amount_cents: 3000,
      order_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
      status: OrderStatus::Processing,
      recipient_name: "Ada".to_string(),
      recipient_phone: "555-0100".to_string(),
      shipping_address: "1 Loop Rd".to_string(),
      created_at: Utc::now(),
    };
    let json = serde_json::to_value(OrderWithItems { order, items: vec![] }).unwrap();
    assert_eq!(json["status"], "Processing");
    assert_eq!(json["user_id"], "u-1");
    assert!(json["items"].as_array().unwrap().is_empty());
  }
}
