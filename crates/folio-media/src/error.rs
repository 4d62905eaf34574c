//! Error type for `folio-media`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("external storage cannot upload files; provide a URL instead")]
  ExternalUpload,

  #[error("database storage is not implemented")]
  DatabaseUnimplemented,

  #[error("storage backend {0:?} is not available in this build")]
  Unavailable(&'static str),

  #[error("storage I/O error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
