// server/src/config.rs

use crate::errors::{AppError, Result};
use bookstore::{OrderSettings, TotalAmountPolicy};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,

  // Apply embedded migrations before serving
  pub run_migrations: bool,

  pub total_policy: TotalAmountPolicy,
  pub strict_status_transitions: bool,
  pub placement_timeout: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source. `from_env` passes the
  /// process environment; tests pass a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse(&lookup, "SERVER_PORT", 5000u16)?;
    let database_url = lookup("DATABASE_URL")
      .ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;
    let database_max_connections = parse(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
    let run_migrations = parse(&lookup, "RUN_MIGRATIONS", true)?;
    let total_policy = parse(&lookup, "ORDER_TOTAL_POLICY", TotalAmountPolicy::Trust)?;
    let strict_status_transitions = parse(&lookup, "STRICT_STATUS_TRANSITIONS", false)?;
    let placement_timeout_ms = parse(&lookup, "PLACEMENT_TIMEOUT_MS", 10_000u64)?;

    if database_max_connections == 0 {
      return Err(AppError::Config("DATABASE_MAX_CONNECTIONS must be at least 1".to_string()));
    }
    if placement_timeout_ms == 0 {
      return Err(AppError::Config("PLACEMENT_TIMEOUT_MS must be at least 1".to_string()));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      total_policy,
      strict_status_transitions,
      placement_timeout: Duration::from_millis(placement_timeout_ms),
    })
  }

  pub fn order_settings(&self) -> OrderSettings {
    OrderSettings {
      total_policy: self.total_policy,
      strict_status_transitions: self.strict_status_transitions,
    }
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match lookup(name) {
    None => Ok(default),
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
  }
}
