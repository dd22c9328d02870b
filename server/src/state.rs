// server/src/state.rs
use crate::config::AppConfig;
use bookstore::{
  BookRequestService, BookRequestStore, BookStore, CartService, CartStore, CatalogService, OrderService, OrderStore,
  UserService, UserStore,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub orders: OrderService,
  pub catalog: CatalogService,
  pub cart: CartService,
  pub requests: BookRequestService,
  pub users: UserService,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  /// Wires every service to one backing store.
  pub fn new<S>(store: Arc<S>, config: Arc<AppConfig>) -> Self
  where
    S: OrderStore + BookStore + CartStore + BookRequestStore + UserStore + 'static,
  {
    let orders = OrderService::new(store.clone(), config.order_settings());
    let catalog = CatalogService::new(store.clone());
    let cart = CartService::new(store.clone());
    let requests = BookRequestService::new(store.clone());
    let users = UserService::new(store);
    Self {
      orders,
      catalog,
      cart,
      requests,
      users,
      config,
    }
  }
}
