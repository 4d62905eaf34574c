//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"message": "..."}` with a status derived from
//! its variant.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  extract::multipart::{MultipartError, MultipartRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use folio_core::error::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  /// A request body axum could not read, with the status it chose.
  #[error("{message}")]
  Body { status: StatusCode, message: String },

  #[error("{0}")]
  Unauthorized(&'static str),

  #[error("{0}")]
  Forbidden(&'static str),

  /// The server cannot authenticate anyone with its current settings.
  #[error("admin authentication misconfigured")]
  Misconfigured,

  #[error(transparent)]
  Media(#[from] folio_media::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Map a store error onto a response class using its [`ErrorKind`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match err.kind() {
      ErrorKind::Validation => Self::BadRequest(err.to_string()),
      ErrorKind::NotFound => Self::NotFound(err.to_string()),
      ErrorKind::Conflict => Self::Conflict(err.to_string()),
      ErrorKind::Internal => Self::Store(Box::new(err)),
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Body { status, .. } => *status,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::Misconfigured
      | Self::Media(_)
      | Self::Store(_)
      | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      Self::Store(e) => {
        tracing::error!(error = %e, "store failure");
        "internal server error".to_owned()
      }
      Self::Internal(e) => {
        tracing::error!(error = %e, "internal failure");
        "internal server error".to_owned()
      }
      other => other.to_string(),
    };
    (status, Json(json!({ "message": message }))).into_response()
  }
}

// ─── Extractor rejections ────────────────────────────────────────────────────

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<MultipartRejection> for ApiError {
  fn from(rejection: MultipartRejection) -> Self {
    Self::Body { status: rejection.status(), message: rejection.body_text() }
  }
}

// An oversized upload surfaces here as 413.
impl From<MultipartError> for ApiError {
  fn from(err: MultipartError) -> Self {
    Self::Body { status: err.status(), message: err.body_text() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_errors_follow_their_kind() {
    let err = ApiError::store(folio_core::Error::PostNotFound(3));
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "post not found: 3");

    let err = ApiError::store(folio_core::Error::Validation("bad".into()));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
  }

  #[test]
  fn media_failures_are_server_errors() {
    let err = ApiError::from(folio_media::Error::DatabaseUnimplemented);
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.to_string(), "database storage is not implemented");
  }
}
