// server/src/lib.rs

//! HTTP front of the bookstore: configuration, the PostgreSQL store,
//! error-to-response mapping and the actix-web routes.

pub mod config;
pub mod db;
pub mod errors;
pub mod state;
pub mod web;
