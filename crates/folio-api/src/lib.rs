//! JSON HTTP API for Folio.
//!
//! Exposes an axum [`Router`] backed by any [`BlogStore`]: a public read API
//! under `/api`, the token endpoint, and the admin API under `/api/admin`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod visitor;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use folio_core::store::BlogStore;
use folio_media::{MediaConfig, MediaStorage};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;
use handlers::{categories, media, posts, public, token};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FOLIO_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Size of the featured and popular listings.
  pub featured_limit:   usize,
  pub recent_limit:     usize,
  pub max_upload_bytes: usize,
  pub auth:             AuthConfig,
  pub media:            MediaConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_owned(),
      port:             8080,
      store_path:       PathBuf::from("folio.db"),
      featured_limit:   6,
      recent_limit:     12,
      max_upload_bytes: 25 * 1024 * 1024,
      auth:             AuthConfig::default(),
      media:            MediaConfig::default(),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: BlogStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AuthConfig>,
  pub media:  Arc<dyn MediaStorage>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BlogStore + Clone + 'static,
{
  let upload_limit = state.config.max_upload_bytes;

  let public = Router::new()
    .route("/posts",                get(public::list::<S>))
    .route("/posts/featured",       get(public::featured::<S>))
    .route("/posts/recent",         get(public::recent::<S>))
    .route("/posts/popular",        get(public::popular::<S>))
    .route("/posts/{slug}",         get(public::get_by_slug::<S>))
    .route("/categories",           get(public::categories::<S>))
    .route("/auth/token",           post(token::issue::<S>));

  let admin = Router::new()
    .route("/posts",                get(posts::list::<S>).post(posts::create::<S>))
    .route(
      "/posts/{id}",
      get(posts::get_one::<S>)
        .put(posts::update::<S>)
        .delete(posts::remove::<S>),
    )
    .route("/posts/{id}/metrics",   get(posts::metrics::<S>))
    .route("/categories",           get(categories::list::<S>).post(categories::create::<S>))
    .route(
      "/categories/{id}",
      put(categories::update::<S>).delete(categories::remove::<S>),
    )
    .route(
      "/media",
      post(media::upload::<S>).layer(DefaultBodyLimit::max(upload_limit)),
    );

  Router::new()
    .nest("/api", public.nest("/admin", admin))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use folio_core::post::PostStatus;
  use folio_media::LocalStorage;
  use folio_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  use crate::auth::{ADMIN_ROLE, hash_password, issue_token};

  struct Harness {
    state:  AppState<SqliteStore>,
    token:  String,
    // Kept alive for the media directory.
    _media: TempDir,
  }

  async fn harness_with(auth: AuthConfig) -> Harness {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let media_dir = tempfile::tempdir().unwrap();
    // Misconfigured auth leaves the harness without a token.
    let token = issue_token(&auth, "admin", ADMIN_ROLE).unwrap_or_default();

    let config = ServerConfig { auth: auth.clone(), ..ServerConfig::default() };
    let state = AppState {
      store:  Arc::new(store),
      config: Arc::new(config),
      auth:   Arc::new(auth),
      media:  Arc::new(LocalStorage::new(media_dir.path(), "/media")),
    };
    Harness { state, token, _media: media_dir }
  }

  fn auth_config() -> AuthConfig {
    AuthConfig {
      password_hash: hash_password("hunter2").unwrap(),
      jwt_secret: "test-secret".into(),
      ..AuthConfig::default()
    }
  }

  async fn harness() -> Harness { harness_with(auth_config()).await }

  impl Harness {
    async fn send(&self, req: Request<Body>) -> Response {
      router(self.state.clone()).oneshot(req).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
      self
        .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
    }

    async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
      let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
      let body = match body {
        Some(v) => {
          builder = builder.header(header::CONTENT_TYPE, "application/json");
          Body::from(v.to_string())
        }
        None => Body::empty(),
      };
      self.send(builder.body(body).unwrap()).await
    }

    async fn create_published(&self, slug: &str) -> Value {
      let resp = self
        .admin(
          "POST",
          "/api/admin/posts",
          Some(json!({ "slug": slug, "title": slug, "status": "PUBLISHED" })),
        )
        .await;
      assert_eq!(resp.status(), StatusCode::CREATED);
      json_body(resp).await
    }
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── Auth ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_routes_require_a_token() {
    let h = harness().await;

    let resp = h.get("/api/admin/posts").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["message"], "missing bearer token");

    let req = Request::builder()
      .uri("/api/admin/posts")
      .header(header::AUTHORIZATION, "Bearer not-a-jwt")
      .body(Body::empty())
      .unwrap();
    assert_eq!(h.send(req).await.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn bearer_scheme_ignores_case() {
    let h = harness().await;
    for scheme in ["bearer", "BEARER", "BeArEr"] {
      let req = Request::builder()
        .uri("/api/admin/posts")
        .header(header::AUTHORIZATION, format!("{scheme} {}", h.token))
        .body(Body::empty())
        .unwrap();
      assert_eq!(h.send(req).await.status(), StatusCode::OK, "{scheme}");
    }
  }

  #[tokio::test]
  async fn unusable_token_ttl_is_a_server_error() {
    let h = harness_with(AuthConfig { token_ttl_hours: i64::MAX, ..auth_config() }).await;
    let req = Request::builder()
      .method("POST")
      .uri("/api/auth/token")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json!({ "username": "admin", "password": "hunter2" }).to_string()))
      .unwrap();
    let resp = h.send(req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await["message"], "admin authentication misconfigured");
  }

  #[tokio::test]
  async fn non_admin_role_is_forbidden() {
    let h = harness().await;
    let token = issue_token(&h.state.auth, "reader", "user").unwrap();
    let req = Request::builder()
      .uri("/api/admin/posts")
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .body(Body::empty())
      .unwrap();
    assert_eq!(h.send(req).await.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn empty_secret_is_a_server_error() {
    let h = harness_with(AuthConfig { jwt_secret: String::new(), ..auth_config() }).await;
    let resp = h.admin("GET", "/api/admin/posts", None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await["message"], "admin authentication misconfigured");
  }

  #[tokio::test]
  async fn token_endpoint_checks_the_password() {
    let h = harness().await;
    let login = |password: &str| {
      Request::builder()
        .method("POST")
        .uri("/api/auth/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
          json!({ "username": "admin", "password": password }).to_string(),
        ))
        .unwrap()
    };

    assert_eq!(h.send(login("nope")).await.status(), StatusCode::UNAUTHORIZED);

    let resp = h.send(login("hunter2")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 12 * 3600);
    let token = body["access_token"].as_str().unwrap();

    let req = Request::builder()
      .uri("/api/admin/posts")
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .body(Body::empty())
      .unwrap();
    assert_eq!(h.send(req).await.status(), StatusCode::OK);
  }

  // ── Posts ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn named_author_overrides_token_subject() {
    let h = harness().await;
    let resp = h
      .admin(
        "POST",
        "/api/admin/posts",
        Some(json!({ "slug": "guest", "title": "Guest", "author": "ivana" })),
      )
      .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post = json_body(resp).await;
    assert_eq!(post["author"], "ivana");

    let id = post["id"].as_i64().unwrap();
    let resp = h
      .admin("PUT", &format!("/api/admin/posts/{id}"), Some(json!({ "author": "mallory" })))
      .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["author"], "ivana");
  }

  #[tokio::test]
  async fn create_update_delete_post() {
    let h = harness().await;
    let resp = h
      .admin(
        "POST",
        "/api/admin/posts",
        Some(json!({
          "slug": "hello",
          "title": "Hello",
          "chapters": [{ "type": "IMAGE" }, { "type": "TEXT", "text_content": "x" }],
        })),
      )
      .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post = json_body(resp).await;
    assert_eq!(post["status"], "DRAFT");
    assert_eq!(post["author"], "admin");
    assert_eq!(post["chapters"][0]["position"], 0);
    assert_eq!(post["chapters"][1]["position"], 1);
    let id = post["id"].as_i64().unwrap();

    let resp = h
      .admin("PUT", &format!("/api/admin/posts/{id}"), Some(json!({ "status": "PUBLISHED" })))
      .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let post = json_body(resp).await;
    assert_eq!(post["status"], PostStatus::Published.as_str());
    assert!(post["published_at"].is_string());

    let resp = h.admin("DELETE", &format!("/api/admin/posts/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = h.admin("GET", &format!("/api/admin/posts/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn scheduled_without_timestamp_is_bad_request() {
    let h = harness().await;
    let resp = h
      .admin(
        "POST",
        "/api/admin/posts",
        Some(json!({ "slug": "s", "title": "S", "status": "SCHEDULED" })),
      )
      .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      json_body(resp).await["message"],
      folio_core::lifecycle::SCHEDULED_WITHOUT_TIMESTAMP
    );
  }

  #[tokio::test]
  async fn malformed_body_is_bad_request() {
    let h = harness().await;
    let resp = h
      .admin("POST", "/api/admin/posts", Some(json!({ "title": "no slug" })))
      .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn duplicate_slug_is_conflict() {
    let h = harness().await;
    h.create_published("dup").await;
    let resp = h
      .admin("POST", "/api/admin/posts", Some(json!({ "slug": "dup", "title": "Again" })))
      .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn unknown_category_ids_are_ignored() {
    let h = harness().await;
    for slug in ["one", "two"] {
      let resp = h
        .admin("POST", "/api/admin/categories", Some(json!({ "name": slug, "slug": slug })))
        .await;
      assert_eq!(resp.status(), StatusCode::CREATED);
    }
    let resp = h
      .admin(
        "POST",
        "/api/admin/posts",
        Some(json!({ "slug": "c", "title": "C", "category_ids": [1, 2, 999] })),
      )
      .await;
    let post = json_body(resp).await;
    let mut ids: Vec<i64> = post["categories"]
      .as_array()
      .unwrap()
      .iter()
      .map(|c| c["id"].as_i64().unwrap())
      .collect();
    ids.sort();
    assert_eq!(ids, [1, 2]);
  }

  // ── Public reads ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn reading_a_post_records_a_visit() {
    let h = harness().await;
    let post = h.create_published("read-me").await;
    let id = post["id"].as_i64().unwrap();

    for session in ["s1", "s1", "s2"] {
      let req = Request::builder()
        .uri("/api/posts/read-me")
        .header("x-session-id", session)
        .body(Body::empty())
        .unwrap();
      let resp = h.send(req).await;
      assert_eq!(resp.status(), StatusCode::OK);
      assert_eq!(json_body(resp).await["slug"], "read-me");
    }

    let resp = h.admin("GET", &format!("/api/admin/posts/{id}/metrics"), None).await;
    let rows = json_body(resp).await;
    assert_eq!(rows[0]["views"], 3);
    assert_eq!(rows[0]["unique_sessions"], 2);
  }

  #[tokio::test]
  async fn unpublished_or_unknown_slug_is_not_found() {
    let h = harness().await;
    let resp = h
      .admin("POST", "/api/admin/posts", Some(json!({ "slug": "draft", "title": "D" })))
      .await;
    let id = json_body(resp).await["id"].as_i64().unwrap();

    assert_eq!(h.get("/api/posts/draft").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(h.get("/api/posts/nope").await.status(), StatusCode::NOT_FOUND);

    let resp = h.admin("GET", &format!("/api/admin/posts/{id}/metrics"), None).await;
    assert_eq!(json_body(resp).await, json!([]));
  }

  #[tokio::test]
  async fn public_listings() {
    let h = harness().await;
    h.create_published("first").await;
    let resp = h
      .admin(
        "POST",
        "/api/admin/posts",
        Some(json!({
          "slug": "second",
          "title": "Second",
          "summary": "About Rust",
          "status": "PUBLISHED",
          "is_featured": true,
        })),
      )
      .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let all = json_body(h.get("/api/posts").await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let found = json_body(h.get("/api/posts?search=RUST").await).await;
    assert_eq!(found[0]["slug"], "second");
    assert_eq!(found.as_array().unwrap().len(), 1);

    let featured = json_body(h.get("/api/posts/featured").await).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);

    let recent = json_body(h.get("/api/posts/recent").await).await;
    assert_eq!(recent.as_array().unwrap().len(), 2);

    h.get("/api/posts/first").await;
    let popular = json_body(h.get("/api/posts/popular").await).await;
    assert_eq!(popular[0]["slug"], "first");

    let resp = h.get("/api/posts?published_after=not-a-date").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Media ────────────────────────────────────────────────────────────────

  fn multipart(parts: &[(&str, Option<&str>, &str)]) -> (String, String) {
    let boundary = "folio-test-boundary";
    let mut body = String::new();
    for (name, filename, content) in parts {
      body.push_str(&format!("--{boundary}\r\n"));
      match filename {
        Some(f) => body.push_str(&format!(
          "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: text/plain\r\n\r\n"
        )),
        None => body.push_str(&format!(
          "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
        )),
      }
      body.push_str(content);
      body.push_str("\r\n");
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    (format!("multipart/form-data; boundary={boundary}"), body)
  }

  async fn upload(h: &Harness, parts: &[(&str, Option<&str>, &str)]) -> Response {
    let (content_type, body) = multipart(parts);
    let req = Request::builder()
      .method("POST")
      .uri("/api/admin/media")
      .header(header::AUTHORIZATION, format!("Bearer {}", h.token))
      .header(header::CONTENT_TYPE, content_type)
      .body(Body::from(body))
      .unwrap();
    h.send(req).await
  }

  #[tokio::test]
  async fn media_upload_stores_file_and_asset() {
    let h = harness().await;
    let resp = upload(&h, &[("kind", None, "file"), ("file", Some("notes.txt"), "hello")]).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let asset = json_body(resp).await;
    assert_eq!(asset["kind"], "FILE");
    assert_eq!(asset["storage_provider"], "LOCAL");
    assert_eq!(asset["bytes"], 5);
    assert_eq!(asset["mime_type"], "text/plain");
    assert!(asset["storage_path"].as_str().unwrap().starts_with("/media/"));
    assert_eq!(asset["checksum"].as_str().unwrap().len(), 64);
    assert_eq!(asset["uploader"], "admin");
  }

  #[tokio::test]
  async fn oversized_upload_is_payload_too_large() {
    let mut h = harness().await;
    h.state.config = Arc::new(ServerConfig {
      max_upload_bytes: 100,
      ..(*h.state.config).clone()
    });
    let big = "x".repeat(1000);
    let resp = upload(&h, &[("file", Some("big.txt"), big.as_str())]).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
  }

  #[tokio::test]
  async fn media_upload_validates_the_form() {
    let h = harness().await;
    let resp = upload(&h, &[("kind", None, "IMAGE")]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = upload(&h, &[("kind", None, "AUDIO"), ("file", Some("a.txt"), "x")]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["message"], "invalid media kind");
  }

  #[tokio::test]
  async fn media_backend_failure_is_server_error() {
    let mut h = harness().await;
    h.state.media = Arc::new(folio_media::ExternalStorage);
    let resp = upload(&h, &[("file", Some("a.png"), "x")]).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
      json_body(resp).await["message"],
      "external storage cannot upload files; provide a URL instead"
    );
  }
}
