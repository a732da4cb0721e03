//! Fleetsnap Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use fleetsnap_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[database]\npath = \":memory:\"").unwrap();
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [database]
//! path = "data/fleetsnap.db"
//! op_timeout_secs = 5
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! expose_error_detail = false
//!
//! [log]
//! level = "info"
//! format = "console"
//! ```

mod database;
mod error;
mod logging;
mod server;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use database::{DB_ENV_VAR, DatabaseConfig};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use server::ServerConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings (path, per-statement deadline)
    pub database: DatabaseConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.server.validate()?;
        Ok(config)
    }
}
