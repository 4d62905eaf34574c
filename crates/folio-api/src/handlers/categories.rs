//! Admin category endpoints. The public listing lives in
//! [`super::public::categories`].

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  category::{Category, CategoryPatch, NewCategory},
  store::BlogStore,
};

use crate::{AppState, auth::Admin, error::ApiError};

/// `GET /categories`
pub async fn list<S>(
  _: Admin,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let categories = state.store.list_categories().await.map_err(ApiError::store)?;
  Ok(Json(categories))
}

/// `POST /categories`
pub async fn create<S>(
  Admin(claims): Admin,
  State(state): State<AppState<S>>,
  body: Result<Json<NewCategory>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let Json(input) = body?;
  let category = state
    .store
    .create_category(input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(by = %claims.sub, category_id = category.id, "category created");
  Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /categories/{id}`
pub async fn update<S>(
  Admin(claims): Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  body: Result<Json<CategoryPatch>, JsonRejection>,
) -> Result<Json<Category>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let Json(patch) = body?;
  let category = state
    .store
    .update_category(id, patch)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(by = %claims.sub, category_id = id, "category updated");
  Ok(Json(category))
}

/// `DELETE /categories/{id}`
pub async fn remove<S>(
  Admin(claims): Admin,
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  state.store.delete_category(id).await.map_err(ApiError::store)?;
  tracing::info!(by = %claims.sub, category_id = id, "category deleted");
  Ok(StatusCode::NO_CONTENT)
}
