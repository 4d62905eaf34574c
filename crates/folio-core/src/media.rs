//! Media assets: metadata for uploaded files. The bytes themselves live in
//! whichever storage backend produced `storage_path`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum MediaKind {
  #[default]
  Image,
  Video,
  File,
}

impl MediaKind {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// Where an asset's bytes are kept.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum StorageProvider {
  Db,
  Gdrive,
  External,
  Local,
}

impl StorageProvider {
  pub fn as_str(self) -> &'static str { self.into() }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
  pub id:               i64,
  pub kind:             MediaKind,
  pub storage_provider: StorageProvider,
  pub storage_path:     String,
  pub mime_type:        Option<String>,
  pub bytes:            Option<i64>,
  /// SHA-256 hex digest of the uploaded bytes.
  pub checksum:         Option<String>,
  pub width:            Option<i32>,
  pub height:           Option<i32>,
  pub duration_seconds: Option<i32>,
  /// Subject of the admin who uploaded the file.
  pub uploader:         Option<String>,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::BlogStore::add_media`].
#[derive(Debug, Clone)]
pub struct NewMediaAsset {
  pub kind:             MediaKind,
  pub storage_provider: StorageProvider,
  pub storage_path:     String,
  pub mime_type:        Option<String>,
  pub bytes:            Option<i64>,
  pub checksum:         Option<String>,
  pub width:            Option<i32>,
  pub height:           Option<i32>,
  pub duration_seconds: Option<i32>,
  pub uploader:         Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_parses_case_insensitively() {
    assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
    assert_eq!("FILE".parse::<MediaKind>().unwrap(), MediaKind::File);
    assert!("AUDIO".parse::<MediaKind>().is_err());
  }

  #[test]
  fn provider_strings() {
    assert_eq!(StorageProvider::Gdrive.as_str(), "GDRIVE");
    assert_eq!(StorageProvider::Db.as_str(), "DB");
  }
}
