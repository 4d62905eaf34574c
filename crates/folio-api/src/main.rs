//! Folio server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), layers
//! `FOLIO_*` environment variables on top, opens the SQLite store, builds the
//! media backend and serves the JSON API over HTTP.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `FOLIO_AUTH__JWT_SECRET` or `FOLIO_MEDIA__UPLOAD_DIR`.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth.password_hash`:
//!
//! ```text
//! cargo run -p folio-api --bin server -- --hash-password
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use folio_api::{AppState, ServerConfig, auth::hash_password};
use folio_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Folio blog API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("FOLIO")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.auth.token_ttl().is_none() {
    anyhow::bail!(
      "auth.token_ttl_hours must be a positive number of hours, got {}",
      server_cfg.auth.token_ttl_hours
    );
  }
  if server_cfg.auth.jwt_secret.is_empty() {
    tracing::warn!("auth.jwt_secret is empty; the admin API will answer 500");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let media = folio_media::from_config(&server_cfg.media)
    .context("failed to configure media storage")?;

  let state = AppState {
    store:  Arc::new(store),
    auth:   Arc::new(server_cfg.auth.clone()),
    media,
    config: Arc::new(server_cfg.clone()),
  };

  let app = folio_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  // Peer addresses feed the visit origin hash when no proxy header is set.
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
