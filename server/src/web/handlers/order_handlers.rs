// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::model::{OrderStatus, PlaceOrderRequest};
use bookstore::BookstoreError;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CallerId;

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
  pub status: OrderStatus,
}

// --- Handler Implementations ---

#[instrument(
    name = "handler::place_order",
    skip(app_state, req_payload, caller),
    fields(user_id = %caller.0, num_items = req_payload.items.len())
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PlaceOrderRequest>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let timeout = app_state.config.placement_timeout;
  let placement = app_state.orders.place_order(caller.0, req_payload.into_inner());

  // Dropping the placement future on timeout drops its transaction, which rolls back.
  let placed = match tokio::time::timeout(timeout, placement).await {
    Ok(Ok(placed)) => placed,
    Ok(Err(err)) => {
      if let BookstoreError::InsufficientStock(items) = &err {
        warn!(short_items = items.len(), "Order rejected for insufficient stock.");
      }
      return Err(err.into());
    }
    Err(_) => {
      warn!(?timeout, "Order placement timed out.");
      return Err(AppError::Timeout(timeout));
    }
  };

  info!(order_id = %placed.order.order_id, "Order created.");
  Ok(HttpResponse::Created().json(placed))
}

#[instrument(name = "handler::list_orders", skip(app_state, caller), fields(user_id = %caller.0))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, caller: CallerId) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list_orders(&caller.0).await?;
  info!("Fetched {} orders.", orders.len());
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(
    name = "handler::get_order",
    skip(app_state, path, caller),
    fields(user_id = %caller.0, order_id = %path.as_ref())
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.get_order(&caller.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(
    name = "handler::delete_order",
    skip(app_state, path, caller),
    fields(user_id = %caller.0, order_id = %path.as_ref())
)]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let deleted = app_state.orders.delete_order(&caller.0, path.into_inner()).await?;
  info!(order_id = %deleted.order_id, "Order deleted.");
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(
    name = "handler::update_order_status",
    skip(app_state, path, req_payload, caller),
    fields(user_id = %caller.0, order_id = %path.as_ref(), status = %req_payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateStatusPayload>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .update_status(&caller.0, path.into_inner(), req_payload.status)
    .await?;
  info!(status = %order.status, "Order status updated.");
  Ok(HttpResponse::Ok().json(order))
}
