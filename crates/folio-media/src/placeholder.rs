//! Backends that exist so a deployment can name them but that never accept
//! bytes.

use async_trait::async_trait;

use crate::{Error, MediaStorage, Result, StorageObject};

/// For deployments where media is hosted elsewhere and assets are recorded
/// by URL only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalStorage;

#[async_trait]
impl MediaStorage for ExternalStorage {
  async fn upload(&self, _: &str, _: Option<&str>, _: &[u8]) -> Result<StorageObject> {
    Err(Error::ExternalUpload)
  }
}

/// Storing blobs inline in the database. Not implemented.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseStorage;

#[async_trait]
impl MediaStorage for DatabaseStorage {
  async fn upload(&self, _: &str, _: Option<&str>, _: &[u8]) -> Result<StorageObject> {
    Err(Error::DatabaseUnimplemented)
  }
}
