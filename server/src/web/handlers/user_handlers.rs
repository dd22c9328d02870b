// server/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use bookstore::model::{ProfileUpdate, ProfileUpsert, Role, UserId};
use bookstore::ProfileWrite;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CallerId;

#[derive(Deserialize, Debug)]
pub struct RolePayload {
  pub role: Role,
}

#[instrument(name = "handler::get_profile", skip(app_state, caller), fields(user_id = %caller.0))]
pub async fn get_profile_handler(app_state: web::Data<AppState>, caller: CallerId) -> Result<HttpResponse, AppError> {
  let profile = app_state.users.get_profile(&caller.0).await?;
  Ok(HttpResponse::Ok().json(profile))
}

#[instrument(name = "handler::upsert_profile", skip(app_state, req_payload, caller), fields(user_id = %caller.0))]
pub async fn upsert_profile_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<ProfileUpsert>,
  caller: CallerId,
) -> Result<HttpResponse, AppError> {
  let (profile, write) = app_state
    .users
    .upsert_profile(&caller.0, req_payload.into_inner())
    .await?;
  let response = match write {
    ProfileWrite::Created => HttpResponse::Created().json(profile),
    ProfileWrite::Updated => HttpResponse::Ok().json(profile),
  };
  Ok(response)
}

#[instrument(name = "handler::update_profile", skip(app_state, path, req_payload), fields(user_id = %path.as_ref()))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  req_payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
  let user_id = UserId::new(path.into_inner());
  let profile = app_state.users.update_profile(&user_id, req_payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(profile))
}

#[instrument(
    name = "handler::update_role",
    skip(app_state, path, req_payload),
    fields(user_id = %path.as_ref(), role = ?req_payload.role)
)]
pub async fn update_role_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
  req_payload: web::Json<RolePayload>,
) -> Result<HttpResponse, AppError> {
  let user_id = UserId::new(path.into_inner());
  let profile = app_state.users.update_role(&user_id, req_payload.role).await?;
  info!("Role updated.");
  Ok(HttpResponse::Ok().json(profile))
}
