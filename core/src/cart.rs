// core/src/cart.rs

use crate::error::{BookstoreError, BookstoreResult};
use crate::model::{BookId, CartItem, CartLine, UserId};
use crate::store::{CartStore, CartWrite};
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct CartService {
  store: Arc<dyn CartStore>,
}

fn positive(quantity: i32) -> BookstoreResult<i32> {
  if quantity <= 0 {
    return Err(BookstoreError::Validation("Quantity must be greater than zero.".to_string()));
  }
  Ok(quantity)
}

impl CartService {
  pub fn new(store: Arc<dyn CartStore>) -> Self {
    Self { store }
  }

  pub async fn cart(&self, user_id: &UserId) -> BookstoreResult<Vec<CartLine>> {
    self.store.cart_lines(user_id).await
  }

  /// Adds `quantity` copies (1 when absent) of a book to the caller's cart.
  #[instrument(name = "CartService::add_to_cart", skip(self, user_id), fields(user_id = %user_id))]
  pub async fn add_to_cart(
    &self,
    user_id: &UserId,
    book_id: BookId,
    quantity: Option<i32>,
  ) -> BookstoreResult<(CartItem, CartWrite)> {
    let quantity = positive(quantity.unwrap_or(1))?;
    self.store.add_to_cart(user_id, book_id, quantity).await
  }

  #[instrument(name = "CartService::update_quantity", skip(self, user_id), fields(user_id = %user_id))]
  pub async fn update_quantity(&self, user_id: &UserId, book_id: BookId, quantity: i32) -> BookstoreResult<CartItem> {
    let quantity = positive(quantity)?;
    self
      .store
      .set_quantity(user_id, book_id, quantity)
      .await?
      .ok_or_else(|| BookstoreError::not_found("Cart item", book_id))
  }

  pub async fn remove_from_cart(&self, user_id: &UserId, book_id: BookId) -> BookstoreResult<CartItem> {
    self
      .store
      .remove_from_cart(user_id, book_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("Cart item", book_id))
  }

  pub async fn clear_cart(&self, user_id: &UserId) -> BookstoreResult<u64> {
    self.store.clear_cart(user_id).await
  }
}
