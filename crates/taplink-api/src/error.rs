//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use taplink_core::{Error, ErrorClass};
use thiserror::Error;

/// An error returned by an API handler.
///
/// Bodies and path segments that fail to decode are answered with the same
/// `{"error", "code"}` shape as domain errors.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Domain(#[from] Error),
  #[error("invalid request body: {0}")]
  Body(#[from] JsonRejection),
  #[error("invalid path: {0}")]
  Path(#[from] PathRejection),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Domain(err) => domain_status(err),
      Self::Body(rejection) => rejection.status(),
      Self::Path(rejection) => rejection.status(),
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::Domain(err) => err.code(),
      Self::Body(_) => "invalid_body",
      Self::Path(_) => "invalid_path",
    }
  }
}

fn domain_status(err: &Error) -> StatusCode {
  match err.class() {
    ErrorClass::Validation => match err {
      Error::InvalidUid(_) | Error::PublicIdFormatInvalid(_) | Error::UnsupportedClaimMode(_) => {
        StatusCode::BAD_REQUEST
      }
      _ => StatusCode::UNPROCESSABLE_ENTITY,
    },
    ErrorClass::NotFound => StatusCode::NOT_FOUND,
    ErrorClass::Conflict | ErrorClass::State => StatusCode::CONFLICT,
    ErrorClass::Proof => StatusCode::FORBIDDEN,
    ErrorClass::Exhaustion | ErrorClass::Store => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let code = self.code();
    if status.is_server_error() {
      tracing::error!(error = %self, code, "request failed");
    }
    let body = json!({ "error": self.to_string(), "code": code });
    (status, Json(body)).into_response()
  }
}
