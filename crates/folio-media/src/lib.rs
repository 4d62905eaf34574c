//! Pluggable storage for uploaded media bytes.
//!
//! The HTTP layer hands an upload to a [`MediaStorage`] backend, gets back a
//! [`StorageObject`] describing where the bytes went, and records that as a
//! media asset. Which backend is used is decided once at startup by
//! [`from_config`].

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use folio_core::media::StorageProvider;
use serde::Deserialize;
use sha2::{Digest, Sha256};

mod error;
mod local;
mod placeholder;

pub use error::{Error, Result};
pub use local::LocalStorage;
pub use placeholder::{DatabaseStorage, ExternalStorage};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
  pub provider:  StorageProvider,
  /// URL or backend-specific reference to the stored bytes.
  pub path:      String,
  pub mime_type: Option<String>,
  pub size:      u64,
  /// SHA-256 hex digest of the bytes.
  pub checksum:  String,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
  /// Persist `data` and describe where it went.
  ///
  /// `content_type` is the client-declared MIME type; backends fall back to a
  /// guess from `filename` when it is absent.
  async fn upload(
    &self,
    filename: &str,
    content_type: Option<&str>,
    data: &[u8],
  ) -> Result<StorageObject>;
}

pub(crate) fn checksum(data: &[u8]) -> String { hex::encode(Sha256::digest(data)) }

pub(crate) fn resolve_mime(filename: &str, content_type: Option<&str>) -> String {
  match content_type.filter(|c| !c.is_empty()) {
    Some(c) => c.to_owned(),
    None => mime_guess::from_path(filename)
      .first_or_octet_stream()
      .essence_str()
      .to_owned(),
  }
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  #[default]
  Local,
  External,
  Database,
  Gdrive,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
  pub backend:         BackendKind,
  /// Directory the local backend writes into.
  pub upload_dir:      PathBuf,
  /// Prefix of the URLs handed out for locally stored files.
  pub public_base_url: String,
}

impl Default for MediaConfig {
  fn default() -> Self {
    Self {
      backend:         BackendKind::default(),
      upload_dir:      PathBuf::from("uploads"),
      public_base_url: "/media".to_owned(),
    }
  }
}

/// Build the configured backend.
pub fn from_config(config: &MediaConfig) -> Result<Arc<dyn MediaStorage>> {
  let storage: Arc<dyn MediaStorage> = match config.backend {
    BackendKind::Local => Arc::new(LocalStorage::new(
      &config.upload_dir,
      &config.public_base_url,
    )),
    BackendKind::External => Arc::new(ExternalStorage),
    BackendKind::Database => Arc::new(DatabaseStorage),
    BackendKind::Gdrive => return Err(Error::Unavailable("gdrive")),
  };
  tracing::info!(backend = ?config.backend, "media storage configured");
  Ok(storage)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mime_falls_back_to_extension() {
    assert_eq!(resolve_mime("a.png", None), "image/png");
    assert_eq!(resolve_mime("a.png", Some("")), "image/png");
    assert_eq!(resolve_mime("a.png", Some("image/webp")), "image/webp");
    assert_eq!(resolve_mime("blob", None), "application/octet-stream");
  }

  #[test]
  fn checksum_is_sha256_hex() {
    assert_eq!(
      checksum(b"abc"),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn gdrive_is_rejected_at_startup() {
    let config = MediaConfig { backend: BackendKind::Gdrive, ..MediaConfig::default() };
    assert!(matches!(from_config(&config), Err(Error::Unavailable("gdrive"))));
  }
}
