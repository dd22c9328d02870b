// server/src/main.rs

use bookstore_server::config::AppConfig;
use bookstore_server::db::PgStore;
use bookstore_server::state::AppState;
use bookstore_server::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting bookstore server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let store = match PgStore::connect(&app_config.database_url, app_config.database_max_connections).await {
    Ok(store) => {
      tracing::info!(max_connections = app_config.database_max_connections, "Connected to the database.");
      store
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string()));
    }
  };

  if app_config.run_migrations {
    if let Err(e) = store.migrate().await {
      tracing::error!(error = %e, "Failed to apply database migrations.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
    tracing::info!("Database migrations applied.");
  }

  let app_state = AppState::new(Arc::new(store), app_config.clone());

  let server_address = app_config.bind_address();
  tracing::info!(
    total_policy = ?app_config.total_policy,
    strict_status_transitions = app_config.strict_status_transitions,
    "Binding server to {}...",
    server_address
  );

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
