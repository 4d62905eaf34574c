//! Bearer-token authentication for the admin API.
//!
//! Tokens are HMAC-signed JWTs issued by `POST /api/auth/token` after an
//! argon2 password check. Admin handlers take an [`Admin`] argument; the
//! extractor rejects the request before the handler runs.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use chrono::{TimeDelta, Utc};
use folio_core::store::BlogStore;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

pub const ADMIN_ROLE: &str = "admin";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Credentials and signing settings, the `[auth]` table of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
  pub username:        String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash:   String,
  /// HMAC key. Empty disables the admin API.
  pub jwt_secret:      String,
  pub jwt_algorithm:   Algorithm,
  pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self {
      username:        "admin".to_owned(),
      password_hash:   String::new(),
      jwt_secret:      String::new(),
      jwt_algorithm:   Algorithm::HS256,
      token_ttl_hours: 12,
    }
  }
}

impl AuthConfig {
  /// Token lifetime; `None` unless `token_ttl_hours` is positive and keeps
  /// expiry timestamps within range.
  pub fn token_ttl(&self) -> Option<TimeDelta> {
    TimeDelta::try_hours(self.token_ttl_hours)
      .filter(|ttl| *ttl > TimeDelta::zero())
      .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
  }
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub:  String,
  pub role: String,
  pub iat:  i64,
  pub exp:  i64,
}

impl Claims {
  pub fn is_admin(&self) -> bool { self.role == ADMIN_ROLE }
}

fn signing_secret(config: &AuthConfig) -> Result<&[u8], ApiError> {
  if config.jwt_secret.is_empty() {
    return Err(ApiError::Misconfigured);
  }
  Ok(config.jwt_secret.as_bytes())
}

pub fn issue_token(config: &AuthConfig, subject: &str, role: &str) -> Result<String, ApiError> {
  let secret = signing_secret(config)?;
  let now = Utc::now();
  let expires = config
    .token_ttl()
    .and_then(|ttl| now.checked_add_signed(ttl))
    .ok_or(ApiError::Misconfigured)?;
  let claims = Claims {
    sub:  subject.to_owned(),
    role: role.to_owned(),
    iat:  now.timestamp(),
    exp:  expires.timestamp(),
  };
  jsonwebtoken::encode(
    &Header::new(config.jwt_algorithm),
    &claims,
    &EncodingKey::from_secret(secret),
  )
  .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims, ApiError> {
  let secret = signing_secret(config)?;
  jsonwebtoken::decode::<Claims>(
    token,
    &DecodingKey::from_secret(secret),
    &Validation::new(config.jwt_algorithm),
  )
  .map(|data| data.claims)
  .map_err(|e| {
    tracing::warn!(error = %e, "rejected bearer token");
    ApiError::Unauthorized("invalid or expired token")
  })
}

// ─── Passwords ───────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check a login against the configured admin account.
pub fn verify_credentials(config: &AuthConfig, username: &str, password: &str) -> bool {
  if username != config.username {
    return false;
  }
  let Ok(parsed) = PasswordHash::new(&config.password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The credentials of a `Bearer` authorization value. The scheme name is
/// case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
  let (scheme, token) = value.trim_start().split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Present in a handler means the request carried a valid admin token.
#[derive(Debug, Clone)]
pub struct Admin(pub Claims);

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: BlogStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    // Checked first so a misconfigured server never looks like a bad token.
    signing_secret(&state.auth)?;

    let token = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(bearer_token)
      .ok_or(ApiError::Unauthorized("missing bearer token"))?;

    let claims = verify_token(&state.auth, token)?;
    if !claims.is_admin() {
      tracing::warn!(sub = %claims.sub, role = %claims.role, "non-admin token on admin route");
      return Err(ApiError::Forbidden("admin role required"));
    }
    Ok(Admin(claims))
  }
}
