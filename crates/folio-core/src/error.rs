//! Error types for `folio-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or logically inconsistent input. Writes that hit this are
  /// rolled back.
  #[error("{0}")]
  Validation(String),

  #[error("post not found: {0}")]
  PostNotFound(i64),

  #[error("category not found: {0}")]
  CategoryNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of a failure, used by the HTTP layer to pick a
/// status code without knowing which backend produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  /// A uniqueness or foreign-key constraint rejected the write.
  Conflict,
  Internal,
}

/// Implemented by every error type a [`crate::store::BlogStore`] can return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::PostNotFound(_) | Self::CategoryNotFound(_) => ErrorKind::NotFound,
    }
  }
}
