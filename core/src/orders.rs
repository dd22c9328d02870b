// core/src/orders.rs

//! Order lifecycle: placement plus the read, status and delete operations.

use crate::error::{BookstoreError, BookstoreResult};
use crate::model::{Order, OrderId, OrderStatus, OrderWithItems, PlaceOrderRequest, UserId};
use crate::placement::{PlacementEngine, TotalAmountPolicy};
use crate::store::OrderStore;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Knobs for the open questions around totals and status changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderSettings {
  pub total_policy: TotalAmountPolicy,
  /// Enforce [`OrderStatus::can_transition_to`] on status updates.
  pub strict_status_transitions: bool,
}

#[derive(Clone)]
pub struct OrderService {
  store: Arc<dyn OrderStore>,
  engine: PlacementEngine,
  settings: OrderSettings,
}

impl OrderService {
  pub fn new(store: Arc<dyn OrderStore>, settings: OrderSettings) -> Self {
    let engine = PlacementEngine::new(Arc::clone(&store), settings.total_policy);
    Self { store, engine, settings }
  }

  pub async fn place_order(&self, user_id: UserId, request: PlaceOrderRequest) -> BookstoreResult<OrderWithItems> {
    self.engine.place_order(user_id, request).await
  }

  #[instrument(name = "OrderService::list_orders", skip(self, user_id), fields(user_id = %user_id))]
  pub async fn list_orders(&self, user_id: &UserId) -> BookstoreResult<Vec<OrderWithItems>> {
    self.store.orders_for_user(user_id).await
  }

  #[instrument(name = "OrderService::get_order", skip(self, user_id), fields(user_id = %user_id))]
  pub async fn get_order(&self, user_id: &UserId, order_id: OrderId) -> BookstoreResult<OrderWithItems> {
    self
      .store
      .order_for_user(user_id, order_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("Order", order_id))
  }

  /// Overwrites the status of an owned order.
  ///
  /// In permissive mode (the default) any status replaces any other. In strict
  /// mode the transition table is checked against the stored status and the
  /// write is conditional on that status not having changed in between.
  #[instrument(name = "OrderService::update_status", skip(self, user_id), fields(user_id = %user_id))]
  pub async fn update_status(&self, user_id: &UserId, order_id: OrderId, status: OrderStatus) -> BookstoreResult<Order> {
    if !self.settings.strict_status_transitions {
      let updated = self.store.update_status(user_id, order_id, status, None).await?;
      return updated.ok_or_else(|| BookstoreError::not_found("Order", order_id));
    }

    let current = self.get_order(user_id, order_id).await?.order.status;
    if !current.can_transition_to(status) {
      warn!(from = %current, to = %status, "Illegal order status transition.");
      return Err(BookstoreError::Validation(format!(
        "Order status cannot change from {} to {}.",
        current, status
      )));
    }
    match self.store.update_status(user_id, order_id, status, Some(current)).await? {
      Some(order) => Ok(order),
      None => Err(BookstoreError::Conflict(format!(
        "Order {} changed while its status was being updated.",
        order_id
      ))),
    }
  }

  /// Deletes an owned order and its lines. Stock consumed by the order is not
  /// given back.
  #[instrument(name = "OrderService::delete_order", skip(self, user_id), fields(user_id = %user_id))]
  pub async fn delete_order(&self, user_id: &UserId, order_id: OrderId) -> BookstoreResult<Order> {
    let deleted = self
      .store
      .delete_order(user_id, order_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("Order", order_id))?;
    info!(order_id = %order_id, "Order deleted; inventory left as is.");
    Ok(deleted)
  }
}
