// server/src/web/handlers/request_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::model::NewBook;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CallerId;

#[instrument(name = "handler::list_book_requests", skip(app_state))]
pub async fn list_book_requests_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let requests = app_state.requests.list_requests().await?;
  info!("Fetched {} book requests.", requests.len());
  Ok(HttpResponse::Ok().json(requests))
}

#[instrument(
    name = "handler::submit_book_request",
    skip(app_state, req_payload, caller),
    fields(user_id = %caller.0, title = %req_payload.title)
)]
pub async fn submit_book_request_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewBook>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let request = app_state.requests.submit(caller.0, req_payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(request))
}

#[instrument(name = "handler::approve_book_request", skip(app_state, path), fields(book_id = %path.as_ref()))]
pub async fn approve_book_request_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let (request, book) = app_state.requests.approve(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Book request approved",
      "request": request,
      "book": book
  })))
}

#[instrument(name = "handler::reject_book_request", skip(app_state, path), fields(book_id = %path.as_ref()))]
pub async fn reject_book_request_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let request = app_state.requests.reject(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Book request rejected",
      "request": request
  })))
}
