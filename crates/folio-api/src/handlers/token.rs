//! `POST /auth/token`: exchange the admin credentials for a bearer token.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use folio_core::store::BlogStore;
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{ADMIN_ROLE, issue_token, verify_credentials},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub token_type:   &'static str,
  /// Lifetime in seconds.
  pub expires_in:   i64,
}

pub async fn issue<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: BlogStore + Clone + 'static,
{
  let Json(req) = body?;
  if state.auth.jwt_secret.is_empty() {
    return Err(ApiError::Misconfigured);
  }
  let ttl = state.auth.token_ttl().ok_or(ApiError::Misconfigured)?;
  if !verify_credentials(&state.auth, &req.username, &req.password) {
    tracing::warn!(username = %req.username, "failed login");
    return Err(ApiError::Unauthorized("invalid credentials"));
  }

  let access_token = issue_token(&state.auth, &req.username, ADMIN_ROLE)?;
  tracing::info!(username = %req.username, "issued admin token");
  Ok(Json(TokenResponse {
    access_token,
    token_type: "Bearer",
    expires_in: ttl.num_seconds(),
  }))
}
