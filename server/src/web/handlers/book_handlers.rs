// server/src/web/handlers/book_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::model::{BookUpdate, NewBook};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct SearchBooksQuery {
  #[serde(rename = "searchQuery", default)]
  pub search_query: String,
}

#[derive(Deserialize, Debug)]
pub struct StockDeltaPayload {
  pub delta: i32,
}

#[instrument(name = "handler::list_books", skip(app_state))]
pub async fn list_books_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let books = app_state.catalog.list_books().await?;
  info!("Fetched {} books.", books.len());
  Ok(HttpResponse::Ok().json(books))
}

#[instrument(name = "handler::search_books", skip(app_state, query), fields(query = %query.search_query))]
pub async fn search_books_handler(
  app_state: web::Data<AppState>,
  query: web::Query<SearchBooksQuery>,
) -> Result<HttpResponse, AppError> {
  let books = app_state.catalog.search_books(&query.search_query).await?;
  Ok(HttpResponse::Ok().json(books))
}

#[instrument(name = "handler::get_book", skip(app_state, path), fields(book_id = %path.as_ref()))]
pub async fn get_book_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let book = app_state.catalog.get_book(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(book))
}

#[instrument(name = "handler::create_book", skip(app_state, req_payload), fields(title = %req_payload.title))]
pub async fn create_book_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewBook>,
) -> Result<HttpResponse, AppError> {
  let book = app_state.catalog.create_book(req_payload.into_inner()).await?;
  info!(book_id = %book.book_id, "Book created.");
  Ok(HttpResponse::Created().json(book))
}

#[instrument(name = "handler::update_book", skip(app_state, path, req_payload), fields(book_id = %path.as_ref()))]
pub async fn update_book_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<BookUpdate>,
) -> Result<HttpResponse, AppError> {
  let book = app_state
    .catalog
    .update_book(path.into_inner(), req_payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(book))
}

#[instrument(
    name = "handler::adjust_stock",
    skip(app_state, path, req_payload),
    fields(book_id = %path.as_ref(), delta = req_payload.delta)
)]
pub async fn adjust_stock_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<StockDeltaPayload>,
) -> Result<HttpResponse, AppError> {
  let book = app_state.catalog.adjust_stock(path.into_inner(), req_payload.delta).await?;
  info!(stock_quantity = book.stock_quantity, "Stock adjusted.");
  Ok(HttpResponse::Ok().json(book))
}

#[instrument(name = "handler::delete_book", skip(app_state, path), fields(book_id = %path.as_ref()))]
pub async fn delete_book_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let book = app_state.catalog.delete_book(path.into_inner()).await?;
  info!("Book deleted.");
  Ok(HttpResponse::Ok().json(book))
}
