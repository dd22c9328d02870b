// server/src/web/extractors.rs

use actix_web::{FromRequest, HttpRequest};
use bookstore::model::UserId;
use tracing::warn;

use crate::errors::AppError;

/// Header carrying the caller identity set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity taken verbatim from the `x-user-id` header.
///
/// The value is trusted, not authenticated. An empty header is accepted and
/// recorded as-is; an absent or non-UTF-8 one is rejected.
#[derive(Debug, Clone)]
pub struct CallerId(pub UserId);

impl FromRequest for CallerId {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let outcome = match req.headers().get(USER_ID_HEADER) {
      Some(value) => value
        .to_str()
        .map(|raw| CallerId(UserId::new(raw)))
        .map_err(|_| AppError::MissingCaller(format!("The {} header must be valid UTF-8.", USER_ID_HEADER))),
      None => Err(AppError::MissingCaller(format!("The {} header is required.", USER_ID_HEADER))),
    };
    if let Err(err) = &outcome {
      warn!(error = %err, "CallerId extractor rejected the request.");
    }
    futures_util::future::ready(outcome)
  }
}
