// core/src/placement.rs

//! The order placement engine.
//!
//! A checkout runs as one transaction with named steps:
//!
//! 1. `check_stock`: lock the stock row of every distinct book (ascending id,
//!    so concurrent checkouts never lock in opposite orders), then walk the
//!    items in request order and collect every one the remaining stock cannot
//!    cover. Nothing short-circuits.
//! 2. `reserve_stock`: decrement each book through the guarded primitive.
//! 3. `insert_order` and `insert_purchase_items`: persist the order snapshot.
//!
//! Any rejection or store failure rolls the whole transaction back.

use crate::error::{BookstoreError, BookstoreResult};
use crate::model::{LineItem, Order, OrderStatus, OrderWithItems, PlaceOrderRequest, PurchaseItem, UserId};
use crate::store::{OrderStore, PlacementTx, StockAdjustment};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{event, info, instrument, span, warn, Instrument, Level};
use uuid::Uuid;

/// How the persisted `order_amount_cents` is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalAmountPolicy {
  /// Record the total sent by the client verbatim.
  #[default]
  Trust,
  /// Replace it with the sum of `price_cents * quantity` over the items.
  Recompute,
}

impl FromStr for TotalAmountPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "trust" => Ok(TotalAmountPolicy::Trust),
      "recompute" => Ok(TotalAmountPolicy::Recompute),
      other => Err(format!("expected 'trust' or 'recompute', got '{}'", other)),
    }
  }
}

/// Schema check run before any store access.
pub fn validate_request(request: &PlaceOrderRequest) -> BookstoreResult<()> {
  if request.items.is_empty() {
    return Err(BookstoreError::Validation("An order needs at least one item.".to_string()));
  }
  if request.total_amount_cents < 0 {
    return Err(BookstoreError::Validation("Total amount must not be negative.".to_string()));
  }
  for (idx, item) in request.items.iter().enumerate() {
    if item.quantity <= 0 {
      return Err(BookstoreError::Validation(format!(
        "Item {} (book {}): quantity must be a positive integer.",
        idx, item.book_id
      )));
    }
    if item.price_cents < 0 {
      return Err(BookstoreError::Validation(format!(
        "Item {} (book {}): price must not be negative.",
        idx, item.book_id
      )));
    }
    if item.amount_cents().is_none() {
      return Err(BookstoreError::Validation(format!(
        "Item {} (book {}): line amount overflows.",
        idx, item.book_id
      )));
    }
  }
  Ok(())
}

fn items_total(items: &[LineItem]) -> BookstoreResult<i64> {
  items
    .iter()
    .try_fold(0i64, |acc, item| item.amount_cents().and_then(|a| acc.checked_add(a)))
    .ok_or_else(|| BookstoreError::Validation("Order total overflows.".to_string()))
}

/// Runs checkouts against an [`OrderStore`].
#[derive(Clone)]
pub struct PlacementEngine {
  store: Arc<dyn OrderStore>,
  total_policy: TotalAmountPolicy,
}

impl PlacementEngine {
  pub fn new(store: Arc<dyn OrderStore>, total_policy: TotalAmountPolicy) -> Self {
    Self { store, total_policy }
  }

  /// Places one order.
  ///
  /// On success the returned order is committed. On
  /// [`BookstoreError::InsufficientStock`] or any other error nothing was
  /// written. Dropping the returned future before it completes drops the open
  /// transaction, which the store must roll back.
  #[instrument(
    name = "PlacementEngine::place_order",
    skip_all,
    fields(user_id = %user_id, num_items = request.items.len()),
    err(Display)
  )]
  pub async fn place_order(&self, user_id: UserId, request: PlaceOrderRequest) -> BookstoreResult<OrderWithItems> {
    validate_request(&request)?;
    let order_amount_cents = match self.total_policy {
      TotalAmountPolicy::Trust => request.total_amount_cents,
      TotalAmountPolicy::Recompute => {
        let computed = items_total(&request.items)?;
        if computed != request.total_amount_cents {
          warn!(
            supplied = request.total_amount_cents,
            computed, "Client total differs from item sum; recording the computed total."
          );
        }
        computed
      }
    };

    let mut tx = self.store.begin().await?;
    match run_steps(tx.as_mut(), &user_id, &request, order_amount_cents).await {
      Ok(placed) => {
        tx.commit().await?;
        info!(order_id = %placed.order.order_id, amount_cents = order_amount_cents, "Order placed.");
        Ok(placed)
      }
      Err(err) => {
        if let Err(rollback_err) = tx.rollback().await {
          event!(Level::ERROR, error = %rollback_err, "Rollback after failed placement also failed.");
        }
        Err(err)
      }
    }
  }
}

async fn run_steps(
  tx: &mut dyn PlacementTx,
  user_id: &UserId,
  request: &PlaceOrderRequest,
  order_amount_cents: i64,
) -> BookstoreResult<OrderWithItems> {
  check_stock(tx, &request.items)
    .instrument(span!(Level::INFO, "placement_step", step_name = "check_stock"))
    .await?;
  reserve_stock(tx, &request.items)
    .instrument(span!(Level::INFO, "placement_step", step_name = "reserve_stock"))
    .await?;

  let now = Utc::now();
  let order = Order {
    order_id: Uuid::new_v4(),
    user_id: user_id.clone(),
    order_amount_cents,
    order_date: now.date_naive(),
    status: OrderStatus::Processing,
    recipient_name: request.recipient_name.clone(),
    recipient_phone: request.recipient_phone.clone(),
    shipping_address: request.shipping_address.clone(),
    created_at: now,
  };
  tx.insert_order(&order)
    .instrument(span!(Level::INFO, "placement_step", step_name = "insert_order"))
    .await?;

  let items = purchase_items(&order, &request.items)?;
  async {
    for item in &items {
      tx.insert_purchase_item(item).await?;
    }
    Ok::<_, BookstoreError>(())
  }
  .instrument(span!(Level::INFO, "placement_step", step_name = "insert_purchase_items"))
  .await?;

  Ok(OrderWithItems { order, items })
}

async fn check_stock(tx: &mut dyn PlacementTx, items: &[LineItem]) -> BookstoreResult<()> {
  let mut remaining: BTreeMap<Uuid, Option<i32>> = items.iter().map(|item| (item.book_id, None)).collect();
  for (book_id, slot) in remaining.iter_mut() {
    *slot = tx.lock_stock(*book_id).await?;
  }

  let mut insufficient = Vec::new();
  for item in items {
    match remaining.get_mut(&item.book_id) {
      Some(Some(available)) if *available >= item.quantity => *available -= item.quantity,
      Some(Some(available)) => {
        event!(Level::DEBUG, book_id = %item.book_id, available = *available, requested = item.quantity, "Short on stock.");
        insufficient.push(item.clone());
      }
      _ => {
        event!(Level::DEBUG, book_id = %item.book_id, "Book does not exist.");
        insufficient.push(item.clone());
      }
    }
  }

  if insufficient.is_empty() {
    Ok(())
  } else {
    warn!(short_items = insufficient.len(), "Rejecting order: insufficient stock.");
    Err(BookstoreError::InsufficientStock(insufficient))
  }
}

async fn reserve_stock(tx: &mut dyn PlacementTx, items: &[LineItem]) -> BookstoreResult<()> {
  for item in items {
    match tx.adjust_stock(item.book_id, -item.quantity).await? {
      StockAdjustment::Applied(left) => {
        event!(Level::TRACE, book_id = %item.book_id, left, "Stock reserved.");
      }
      StockAdjustment::Refused | StockAdjustment::Missing | StockAdjustment::Overflow => {
        // Only reachable if the store did not honour the row lock taken in check_stock.
        warn!(book_id = %item.book_id, "Guarded decrement refused after stock check.");
        return Err(BookstoreError::InsufficientStock(vec![item.clone()]));
      }
    }
  }
  Ok(())
}

fn purchase_items(order: &Order, items: &[LineItem]) -> BookstoreResult<Vec<PurchaseItem>> {
  let mut lines = Vec::with_capacity(items.len());
  for item in items {
    let amount_cents = item
      .amount_cents()
      .ok_or_else(|| BookstoreError::Internal("line amount overflow after validation".to_string()))?;
    lines.push(PurchaseItem {
      purchase_item_id: Uuid::new_v4(),
      order_id: order.order_id,
      user_id: order.user_id.clone(),
      book_id: item.book_id,
      title: item.title.clone(),
      author: item.author.clone(),
      price_cents: item.price_cents,
      cover_image: item.cover_image.clone(),
      quantity: item.quantity,
      amount_cents,
    });
  }
  Ok(lines)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(items: Vec<LineItem>) -> PlaceOrderRequest {
    PlaceOrderRequest {
      items,
      total_amount_cents: 0,
      recipient_name: "Ada".to_string(),
      recipient_phone: "555-0100".to_string(),
      shipping_address: "1 Loop Rd".to_string(),
    }
  }

  #[test]
  fn rejects_empty_orders_and_bad_quantities() {
    assert!(matches!(validate_request(&request(vec![])), Err(BookstoreError::Validation(_))));

    let mut zero = LineItem::sample();
    zero.quantity = 0;
    assert!(validate_request(&request(vec![zero])).is_err());

    let mut negative_price = LineItem::sample();
    negative_price.price_cents = -5;
    assert!(validate_request(&request(vec![negative_price])).is_err());

    let mut negative_total = request(vec![LineItem::sample()]);
    negative_total.total_amount_cents = -1;
    assert!(validate_request(&negative_total).is_err());
  }

  #[test]
  fn items_total_sums_line_amounts() {
    let mut a = LineItem::sample();
    a.quantity = 3;
    let mut b = LineItem::sample();
    b.price_cents = 250;
    b.quantity = 2;
    assert_eq!(items_total(&[a, b]).unwrap(), 3500);
  }

  #[test]
  fn total_policy_parses_from_config_text() {
    assert_eq!("trust".parse::<TotalAmountPolicy>(), Ok(TotalAmountPolicy::Trust));
    assert_eq!(" Recompute ".parse::<TotalAmountPolicy>(), Ok(TotalAmountPolicy::Recompute));
    assert!("sometimes".parse::<TotalAmountPolicy>().is_err());
  }
}
