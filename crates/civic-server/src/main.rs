//! civic-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! snapshot store, joins the peer overlay as a hub or a joiner, and serves
//! the JSON API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use civic_core::user::Role;
use civic_server::{ServerConfig, app, expand_tilde, operator};
use civic_store_sqlite::SqliteKv;
use civic_sync::{CivicService, peer::TcpSignaling};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Civic Connect store server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Overlay role: `official` runs the hub, `citizen` joins one.
  #[arg(long)]
  role: Option<Role>,

  /// Cloud id (socket address) of the hub to join.
  #[arg(long)]
  join: Option<String>,
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

  let mut cfg = ServerConfig::load(&cli.config).context("failed to read configuration")?;
  if let Some(role) = cli.role {
    cfg.role = role;
  }
  if cli.join.is_some() {
    cfg.join = cli.join;
  }

  let store_path = expand_tilde(&cfg.store_path);
  let kv = SqliteKv::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let service = CivicService::builder(kv)
    .config(cfg.sync.clone())
    .open()
    .await
    .context("failed to load the store")?;

  let _events = service.subscribe(|event| tracing::debug!(event = event.name(), "store event"));

  // Peer overlay.
  let signaling = TcpSignaling::new(cfg.peer_listen);
  let cloud_id = service
    .initialize_cloud_sync(&signaling, &operator(cfg.role))
    .await
    .context("failed to join the peer overlay")?;
  tracing::info!(%cloud_id, role = %cfg.role, "overlay ready");

  if let Some(target) = &cfg.join {
    // A joiner that cannot reach its hub still serves its local copy.
    match service.connect_to_cloud(&signaling, target).await {
      Ok(conn) => tracing::info!(hub = conn.remote_id(), "joined hub"),
      Err(e) => tracing::warn!(hub = %target, error = %e, "could not join hub"),
    }
  }

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app(service)).await.context("server error")?;

  Ok(())
}
