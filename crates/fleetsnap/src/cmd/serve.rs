//! Serve command - run the inventory sync server

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::signal;
use tracing::info;

use fleetsnap_api::{AppState, build_router};
use fleetsnap_config::Config;
use fleetsnap_core::InventoryStore;

/// Default config path probed when none is specified
pub const DEFAULT_CONFIG_PATH: &str = "fleetsnap.toml";

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file (defaults to fleetsnap.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = load_config(args.config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        bind = %config.server.bind,
        "Fleetsnap starting"
    );

    let db_path = config.database.resolved_path();
    let store = if db_path == ":memory:" {
        InventoryStore::in_memory().await
    } else {
        InventoryStore::open(&db_path).await
    }
    .with_context(|| format!("failed to open inventory store at {}", db_path))?
    .with_op_timeout(Duration::from_secs(config.database.op_timeout_secs));

    let state =
        AppState::new(store).with_error_detail(config.server.expose_error_detail);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    info!(addr = %config.server.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Fleetsnap stopped");
    Ok(())
}

/// Load config: explicit path must exist; otherwise probe the default path
/// and fall back to built-in defaults.
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Config::from_file(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Config::from_file(&default)
                    .with_context(|| format!("failed to load config {}", default.display()))
            } else {
                Ok(Config::default())
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
