// core/src/model/user.rs

use super::UserId;
use crate::error::{BookstoreError, BookstoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "user_role", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Salesman,
  #[default]
  Customer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "user_gender", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  Other,
}

/// A user as known to the bookstore. The identifier is the gateway's
/// `x-user-id`; nothing here authenticates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserProfile {
  pub user_id: UserId,
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub profile_image: Option<String>,
  pub dob: Option<NaiveDate>,
  pub gender: Option<Gender>,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Body of the first-login call: creates the profile or refreshes its contact data.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpsert {
  pub name: String,
  pub email: String,
}

impl ProfileUpsert {
  pub fn validate(&self) -> BookstoreResult<()> {
    validate_contact(&self.name, &self.email)
  }
}

/// Full replacement of the editable profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub address: Option<String>,
  #[serde(default)]
  pub profile_image: Option<String>,
  #[serde(default)]
  pub dob: Option<NaiveDate>,
  #[serde(default)]
  pub gender: Option<Gender>,
}

impl ProfileUpdate {
  pub fn validate(&self) -> BookstoreResult<()> {
    validate_contact(&self.name, &self.email)
  }
}

fn validate_contact(name: &str, email: &str) -> BookstoreResult<()> {
  if name.trim().is_empty() {
    return Err(BookstoreError::Validation("Name must not be empty.".to_string()));
  }
  let email = email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(BookstoreError::Validation(format!("'{}' is not a valid email address.", email)));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_and_gender_use_lowercase_names() {
    assert_eq!(serde_json::to_value(Role::Salesman).unwrap(), "salesman");
    assert_eq!(Role::default(), Role::Customer);
    let gender: Gender = serde_json::from_value(serde_json::json!("other")).unwrap();
    assert_eq!(gender, Gender::Other);
    assert!(serde_json::from_value::<Role>(serde_json::json!("root")).is_err());
  }

  #[test]
  fn contact_fields_are_checked() {
    let ok = ProfileUpsert {
      name: "Ada".to_string(),
      email: "ada@example.com".to_string(),
    };
    assert!(ok.validate().is_ok());

    let nameless = ProfileUpsert {
      name: " ".to_string(),
      ..ok.clone()
    };
    assert!(matches!(nameless.validate(), Err(BookstoreError::Validation(_))));

    let update = ProfileUpdate {
      name: "Ada".to_string(),
      email: "not-an-address".to_string(),
      ..ProfileUpdate::default()
    };
    assert!(update.validate().is_err());
  }
}
