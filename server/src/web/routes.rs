// server/src/web/routes.rs

use actix_web::{error, web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{book_handlers, cart_handlers, order_handlers, request_handlers, user_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed bodies, paths and query strings answer 400 with the usual error body.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default().error_handler(|err, _req| error::Error::from(AppError::Validation(err.to_string()))),
    )
    .app_data(
      web::PathConfig::default().error_handler(|err, _req| error::Error::from(AppError::Validation(err.to_string()))),
    )
    .app_data(
      web::QueryConfig::default().error_handler(|err, _req| error::Error::from(AppError::Validation(err.to_string()))),
    );
}

// Called from `main.rs` and from the integration tests to mount every route.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}", web::delete().to(order_handlers::delete_order_handler))
          .route("/{order_id}", web::put().to(order_handlers::update_order_status_handler)),
      )
      .service(
        web::scope("/books")
          .route("", web::get().to(book_handlers::list_books_handler))
          .route("", web::post().to(book_handlers::create_book_handler))
          // Registered before "/{book_id}" so they are not parsed as an id.
          .route("/search-books", web::get().to(book_handlers::search_books_handler))
          .route("/pending-books", web::get().to(request_handlers::list_book_requests_handler))
          .route("/pending-books", web::post().to(request_handlers::submit_book_request_handler))
          .route(
            "/pending-books/{book_id}/approve",
            web::post().to(request_handlers::approve_book_request_handler),
          )
          .route(
            "/pending-books/{book_id}/reject",
            web::delete().to(request_handlers::reject_book_request_handler),
          )
          .route("/{book_id}", web::get().to(book_handlers::get_book_handler))
          .route("/{book_id}", web::put().to(book_handlers::update_book_handler))
          .route("/{book_id}", web::delete().to(book_handlers::delete_book_handler))
          .route("/{book_id}/stock", web::post().to(book_handlers::adjust_stock_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("/add", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/clear", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/remove/{book_id}", web::delete().to(cart_handlers::remove_from_cart_handler))
          .route("/update/{book_id}", web::put().to(cart_handlers::update_cart_quantity_handler)),
      )
      .service(
        web::scope("/users")
          .route("/profile", web::get().to(user_handlers::get_profile_handler))
          .route("/profile", web::post().to(user_handlers::upsert_profile_handler))
          .route("/profile/role/{user_id}", web::put().to(user_handlers::update_role_handler))
          .route("/profile/{user_id}", web::put().to(user_handlers::update_profile_handler)),
      ),
  );
}
