//! Error type for `folio-store-sqlite`.

use folio_core::error::{Classify, ErrorKind};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] folio_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// The SQLite result code behind this error, if there is one.
  pub fn sqlite_code(&self) -> Option<ErrorCode> {
    match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => e.sqlite_error_code(),
      _ => None,
    }
  }

  /// Lock contention or a lost insert race; the operation can be re-run.
  pub(crate) fn is_retryable(&self) -> bool {
    matches!(
      self.sqlite_code(),
      Some(
        ErrorCode::DatabaseBusy
          | ErrorCode::DatabaseLocked
          | ErrorCode::ConstraintViolation
      )
    )
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      _ if self.sqlite_code() == Some(ErrorCode::ConstraintViolation) => {
        ErrorKind::Conflict
      }
      Self::Database(_) => ErrorKind::Internal,
    }
  }
}
