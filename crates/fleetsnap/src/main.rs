//! Fleetsnap - machine inventory sync server
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! fleetsnap
//! fleetsnap serve --config fleetsnap.toml
//! fleetsnap serve --log-level debug
//! ```

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fleetsnap_config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Fleetsnap - machine inventory sync server
#[derive(Parser, Debug)]
#[command(name = "fleetsnap")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Serve(cmd::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // No subcommand = run server (default behavior)
    let args = match cli.command {
        Some(Command::Serve(args)) => args,
        None => cmd::serve::ServeArgs { config: None },
    };

    // Log settings come from the same config file serve will load.
    let config_path = args.config.clone().or_else(|| {
        let default = PathBuf::from(cmd::serve::DEFAULT_CONFIG_PATH);
        default.exists().then_some(default)
    });
    let (level, format) = resolve_logging(cli.log_level.as_deref(), config_path.as_deref());
    init_logging(&level, format)?;

    cmd::serve::run(args).await
}

/// Resolve log settings: CLI flag > config file > default "info"/console
fn resolve_logging(
    cli_level: Option<&str>,
    config_path: Option<&std::path::Path>,
) -> (String, LogFormat) {
    let from_config = config_path
        .filter(|p| p.exists())
        .and_then(|p| Config::from_file(p).ok())
        .map(|c| c.log);

    let format = from_config
        .as_ref()
        .map(|log| log.format)
        .unwrap_or_default();

    if let Some(level) = cli_level {
        return (level.to_string(), format);
    }

    let level = from_config
        .map(|log| log.level.as_str().to_string())
        .unwrap_or_else(|| "info".to_string());

    (level, format)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}
