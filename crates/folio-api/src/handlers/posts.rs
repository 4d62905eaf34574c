//! Admin post endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts` | Every status |
//! | `POST`   | `/posts` | Body: [`NewPost`] |
//! | `GET`    | `/posts/{id}` | |
//! | `PUT`    | `/posts/{id}` | Body: [`PostPatch`] |
//! | `DELETE` | `/posts/{id}` | |
//! | `GET`    | `/posts/{id}/metrics` | Daily rows, oldest first |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  post::{NewPost, Post, PostPatch},
  store::BlogStore,
  visit::PostMetricsDaily,
};

use crate::{AppState, auth::Admin, error::ApiError};

async fn require_post<S>(state: &AppState<S>, id: i64) -> Result<Post, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  state
    .store
    .get_post(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("post not found: {id}")))
}

/// `GET /posts`
pub async fn list<S>(
  _: Admin,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let posts = state.store.list_posts().await.map_err(ApiError::store)?;
  Ok(Json(posts))
}

/// `POST /posts`
pub async fn create<S>(
  Admin(claims): Admin,
  State(state): State<AppState<S>>,
  body: Result<Json<NewPost>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let Json(input) = body?;
  let post = state
    .store
    .create_post(input.or_author(&claims.sub))
    .await
    .map_err(ApiError::store)?;
  tracing::info!(by = %claims.sub, post_id = post.id, slug = post.slug(), "post created");
  Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /posts/{id}`
pub async fn get_one<S>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  Ok(Json(require_post(&state, id).await?))
}

/// `PUT /posts/{id}`
pub async fn update<S>(
  Admin(claims): Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  body: Result<Json<PostPatch>, JsonRejection>,
) -> Result<Json<Post>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let Json(patch) = body?;
  let post = state.store.update_post(id, patch).await.map_err(ApiError::store)?;
  tracing::info!(
    by = %claims.sub,
    post_id = id,
    status = post.status().as_str(),
    "post updated"
  );
  Ok(Json(post))
}

/// `DELETE /posts/{id}`
pub async fn remove<S>(
  Admin(claims): Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  state.store.delete_post(id).await.map_err(ApiError::store)?;
  tracing::info!(by = %claims.sub, post_id = id, "post deleted");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /posts/{id}/metrics`
pub async fn metrics<S>(
  _: Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<PostMetricsDaily>>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  require_post(&state, id).await?;
  let rows = state.store.post_metrics(id).await.map_err(ApiError::store)?;
  Ok(Json(rows))
}
