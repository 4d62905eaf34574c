//! Local filesystem backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use folio_core::media::StorageProvider;

use crate::{MediaStorage, Result, StorageObject, checksum, resolve_mime};

/// Stores uploads in a directory under UUID-based names, keeping the
/// original extension so the files can be served statically.
#[derive(Debug, Clone)]
pub struct LocalStorage {
  upload_dir:      PathBuf,
  public_base_url: String,
}

impl LocalStorage {
  pub fn new(upload_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
    Self {
      upload_dir:      upload_dir.into(),
      public_base_url: public_base_url.into().trim_end_matches('/').to_owned(),
    }
  }

  pub fn upload_dir(&self) -> &Path { &self.upload_dir }

  fn stored_name(filename: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
      Some(ext) => format!("{id}.{ext}"),
      None => id.to_string(),
    }
  }
}

#[async_trait]
impl MediaStorage for LocalStorage {
  async fn upload(
    &self,
    filename: &str,
    content_type: Option<&str>,
    data: &[u8],
  ) -> Result<StorageObject> {
    tokio::fs::create_dir_all(&self.upload_dir).await?;

    let stored_name = Self::stored_name(filename);
    tokio::fs::write(self.upload_dir.join(&stored_name), data).await?;

    tracing::info!(filename, stored_name = %stored_name, size = data.len(), "stored upload locally");

    Ok(StorageObject {
      provider:  StorageProvider::Local,
      path:      format!("{}/{stored_name}", self.public_base_url),
      mime_type: Some(resolve_mime(filename, content_type)),
      size:      data.len() as u64,
      checksum:  checksum(data),
    })
  }
}
