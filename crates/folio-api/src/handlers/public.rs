//! Unauthenticated read endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/posts` | `?category=<slug>&search=<text>&published_before=&published_after=` |
//! | `GET`  | `/posts/featured` | |
//! | `GET`  | `/posts/recent` | |
//! | `GET`  | `/posts/popular` | By total views |
//! | `GET`  | `/posts/{slug}` | Records a visit |
//! | `GET`  | `/categories` | |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::QueryRejection},
};
use chrono::{DateTime, Utc};
use folio_core::{
  category::Category,
  post::Post,
  store::{BlogStore, PostQuery},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, visitor::Visitor};

fn non_empty(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub category:         Option<String>,
  pub search:           Option<String>,
  pub published_before: Option<DateTime<Utc>>,
  pub published_after:  Option<DateTime<Utc>>,
}

impl From<ListParams> for PostQuery {
  fn from(params: ListParams) -> Self {
    PostQuery {
      category:         non_empty(params.category),
      search:           non_empty(params.search),
      published_before: params.published_before,
      published_after:  params.published_after,
    }
  }
}

/// `GET /posts`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let Query(params) = params?;
  let query = PostQuery::from(params);
  let posts = state
    .store
    .list_published(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

// ─── Curated listings ────────────────────────────────────────────────────────

/// `GET /posts/featured`
pub async fn featured<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let posts = state
    .store
    .featured_posts(state.config.featured_limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

/// `GET /posts/recent`
pub async fn recent<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let posts = state
    .store
    .recent_posts(state.config.recent_limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

/// `GET /posts/popular`
pub async fn popular<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let posts = state
    .store
    .popular_posts(state.config.featured_limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

// ─── Single post ─────────────────────────────────────────────────────────────

/// `GET /posts/{slug}`: serves the post even if the visit cannot be
/// recorded.
pub async fn get_by_slug<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  Visitor(visit): Visitor,
) -> Result<Json<Post>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let post = state
    .store
    .get_published_post(&slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("post {slug} not found")))?;

  match state.store.record_visit(post.id, visit, Utc::now()).await {
    Ok(metrics) => tracing::debug!(
      post_id = post.id,
      views = metrics.views,
      unique_sessions = metrics.unique_sessions,
      "recorded visit"
    ),
    Err(e) => tracing::warn!(post_id = post.id, error = %e, "failed to record visit"),
  }
  Ok(Json(post))
}

// ─── Categories ──────────────────────────────────────────────────────────────

/// `GET /categories`
pub async fn categories<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let categories = state.store.list_categories().await.map_err(ApiError::store)?;
  Ok(Json(categories))
}
