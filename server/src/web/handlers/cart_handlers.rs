// server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::CartWrite;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CallerId;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct AddToCartPayload {
  pub book_id: Uuid,
  #[serde(default)]
  pub quantity: Option<i32>, // defaults to 1
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityPayload {
  pub quantity: i32,
}

// --- Handler Implementations ---

#[instrument(name = "handler::get_cart", skip(app_state, caller), fields(user_id = %caller.0))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, caller: CallerId) -> Result<HttpResponse, AppError> {
  let lines = app_state.cart.cart(&caller.0).await?;
  Ok(HttpResponse::Ok().json(lines))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, caller),
    fields(user_id = %caller.0, book_id = %req_payload.book_id, quantity = ?req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartPayload>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let (item, write) = app_state
    .cart
    .add_to_cart(&caller.0, req_payload.book_id, req_payload.quantity)
    .await?;

  info!(quantity = item.quantity, outcome = ?write, "Cart line written.");
  let response = match write {
    CartWrite::Inserted => HttpResponse::Created().json(item),
    CartWrite::Merged => HttpResponse::Ok().json(item),
  };
  Ok(response)
}

#[instrument(
    name = "handler::update_cart_quantity",
    skip(app_state, path, req_payload, caller),
    fields(user_id = %caller.0, book_id = %path.as_ref(), quantity = req_payload.quantity)
)]
pub async fn update_cart_quantity_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateQuantityPayload>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let item = app_state
    .cart
    .update_quantity(&caller.0, path.into_inner(), req_payload.quantity)
    .await?;
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(
    name = "handler::remove_from_cart",
    skip(app_state, path, caller),
    fields(user_id = %caller.0, book_id = %path.as_ref())
)]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let removed = app_state.cart.remove_from_cart(&caller.0, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(removed))
}

#[instrument(name = "handler::clear_cart", skip(app_state, caller), fields(user_id = %caller.0))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, caller: CallerId) -> Result<HttpResponse, AppError> {
  let removed = app_state.cart.clear_cart(&caller.0).await?;
  info!(removed, "Cart cleared.");
  Ok(HttpResponse::Ok().json(json!({
      "message": "Cart cleared successfully.",
      "userId": caller.0,
      "removed": removed
  })))
}
