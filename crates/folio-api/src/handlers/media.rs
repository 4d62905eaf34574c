//! `POST /media`: multipart upload.
//!
//! Form fields: `file` (required) and `kind` (`IMAGE`, `VIDEO` or `FILE`,
//! case-insensitive, default `IMAGE`). The bytes go to the configured
//! [`folio_media::MediaStorage`]; the returned location is recorded as a
//! media asset credited to the token subject.

use axum::{
  Json,
  extract::{Multipart, State, multipart::MultipartRejection},
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  media::{MediaKind, NewMediaAsset},
  store::BlogStore,
};

use crate::{AppState, auth::Admin, error::ApiError};

struct Upload {
  filename:     String,
  content_type: Option<String>,
  data:         Vec<u8>,
}

pub async fn upload<S>(
  Admin(claims): Admin,
  State(state): State<AppState<S>>,
  form: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let mut form = form?;
  let mut kind = MediaKind::default();
  let mut file = None;

  while let Some(field) = form.next_field().await? {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("file") => {
        let filename = field
          .file_name()
          .filter(|f| !f.is_empty())
          .unwrap_or("upload")
          .to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await?.to_vec();
        file = Some(Upload { filename, content_type, data });
      }
      Some("kind") => {
        let raw = field.text().await?;
        kind = raw
          .trim()
          .parse()
          .map_err(|_| ApiError::BadRequest("invalid media kind".to_owned()))?;
      }
      _ => {}
    }
  }

  let file = file.ok_or_else(|| ApiError::BadRequest("file is required".to_owned()))?;
  let object = state
    .media
    .upload(&file.filename, file.content_type.as_deref(), &file.data)
    .await?;

  let asset = state
    .store
    .add_media(NewMediaAsset {
      kind,
      storage_provider: object.provider,
      storage_path:     object.path,
      mime_type:        object.mime_type,
      bytes:            i64::try_from(object.size).ok(),
      checksum:         Some(object.checksum),
      width:            None,
      height:           None,
      duration_seconds: None,
      uploader:         Some(claims.sub.clone()),
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    by = %claims.sub,
    media_id = asset.id,
    kind = kind.as_str(),
    filename = %file.filename,
    "media uploaded"
  );
  Ok((StatusCode::CREATED, Json(asset)))
}
