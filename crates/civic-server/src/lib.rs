//! Hosting glue for a Civic Connect instance: configuration, the HTTP app,
//! and the overlay identity the server joins as.

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
};

use axum::Router;
use civic_core::{
  database::official_accounts,
  ports::KeyValueStore,
  user::{NewUser, Role, User},
};
use civic_sync::{CivicService, SyncConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CIVIC_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  /// `official` advertises the stable hub identity; `citizen` a random one.
  pub role:        Role,
  /// Where the peer overlay listens. Its bound address is the cloud id.
  pub peer_listen: SocketAddr,
  /// Cloud id (socket address) of a hub to connect to after start-up.
  pub join:        Option<String>,
  pub sync:        SyncConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:        "127.0.0.1".to_owned(),
      port:        8080,
      store_path:  PathBuf::from("civic.db"),
      role:        Role::Official,
      peer_listen: SocketAddr::from(([0, 0, 0, 0], 7070)),
      join:        None,
      sync:        SyncConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Layer `file` (optional) under `CIVIC_*` environment variables. Nested
  /// keys use `__`, e.g. `CIVIC_SYNC__BOOTSTRAP_DELAY_MS`.
  pub fn load(file: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("CIVIC")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// The user this server joins the overlay as. Only the role matters to the
/// overlay; officials reuse the first built-in account.
pub fn operator(role: Role) -> User {
  match role {
    Role::Official => {
      let [admin, _] = official_accounts();
      admin
    }
    Role::Citizen => NewUser { name: "civic-server".to_owned(), ..NewUser::default() }.into_citizen(),
  }
}

/// The full HTTP app: the API under `/api`, with request tracing.
pub fn app<K: KeyValueStore>(service: CivicService<K>) -> Router {
  Router::new()
    .nest("/api", civic_api::api_router(service))
    .layer(TraceLayer::new_for_http())
}
