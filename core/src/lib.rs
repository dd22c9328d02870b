// src/lib.rs

//! Core of the bookstore backend.
//!
//! The crate owns the domain model, the error taxonomy and the store
//! abstractions, and on top of them:
//!  - the order placement engine, which reserves inventory and records an
//!    order with its line items as one all-or-nothing transaction;
//!  - the order, catalog, cart, book request and user profile services the
//!    HTTP layer calls into;
//!  - [`MemoryStore`], a transactional in-process store used by tests and
//!    benchmarks.
//!
//! PostgreSQL row mapping is available behind the `sqlx` feature.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod model;
pub mod orders;
pub mod placement;
pub mod requests;
pub mod store;
pub mod users;

pub use crate::cart::CartService;
pub use crate::catalog::CatalogService;
pub use crate::error::{BookstoreError, BookstoreResult};
pub use crate::orders::{OrderService, OrderSettings};
pub use crate::placement::{PlacementEngine, TotalAmountPolicy};
pub use crate::requests::BookRequestService;
pub use crate::store::memory::FailPoint;
pub use crate::store::{
  BookEdit, BookRequestStore, BookStore, CartStore, CartWrite, MemoryStore, OrderStore, PlacementTx, ProfileWrite,
  StockAdjustment, UserStore,
};
pub use crate::users::UserService;
