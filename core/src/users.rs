// core/src/users.rs

use crate::error::{BookstoreError, BookstoreResult};
use crate::model::{ProfileUpdate, ProfileUpsert, Role, UserId, UserProfile};
use crate::store::{ProfileWrite, UserStore};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct UserService {
  store: Arc<dyn UserStore>,
}

impl UserService {
  pub fn new(store: Arc<dyn UserStore>) -> Self {
    Self { store }
  }

  pub async fn get_profile(&self, user_id: &UserId) -> BookstoreResult<UserProfile> {
    self
      .store
      .get_profile(user_id)
      .await?
      .ok_or_else(|| BookstoreError::not_found("User", user_id))
  }

  /// New profiles start out as customers; an existing profile only has its
  /// name and email refreshed.
  #[instrument(name = "UserService::upsert_profile", skip(self, user_id, contact), fields(user_id = %user_id))]
  pub async fn upsert_profile(&self, user_id: &UserId, contact: ProfileUpsert) -> BookstoreResult<(UserProfile, ProfileWrite)> {
    contact.validate()?;
    let (profile, write) = self.store.upsert_profile(user_id, &contact).await?;
    info!(outcome = ?write, "Profile written.");
    Ok((profile, write))
  }

  #[instrument(name = "UserService::update_profile", skip(self, user_id, update), fields(user_id = %user_id))]
  pub async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> BookstoreResult<UserProfile> {
    update.validate()?;
    self
      .store
      .update_profile(user_id, &update)
      .await?
      .ok_or_else(|| BookstoreError::not_found("User", user_id))
  }

  #[instrument(name = "UserService::update_role", skip(self, user_id), fields(user_id = %user_id))]
  pub async fn update_role(&self, user_id: &UserId, role: Role) -> BookstoreResult<UserProfile> {
    let profile = self
      .store
      .update_role(user_id, role)
      .await?
      .ok_or_else(|| BookstoreError::not_found("User", user_id))?;
    info!(role = ?profile.role, "Role changed.");
    Ok(profile)
  }
}
