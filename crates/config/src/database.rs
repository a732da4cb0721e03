//! Database configuration
//!
//! Points at the SQLite file holding inventory records. The `FLEETSNAP_DB`
//! environment variable takes precedence over the file value, so a deploy
//! can relocate the store without editing the config file.

use serde::Deserialize;

/// Environment variable overriding the configured database path
pub const DB_ENV_VAR: &str = "FLEETSNAP_DB";

/// Database configuration
///
/// # Example
///
/// ```toml
/// [database]
/// path = "data/fleetsnap.db"
/// op_timeout_secs = 5
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (`:memory:` for an in-memory store)
    /// Default: data/fleetsnap.db
    pub path: String,

    /// Per-statement deadline in seconds
    /// Default: 5
    pub op_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/fleetsnap.db".to_string(),
            op_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    /// Resolve the effective path: environment variable over file value
    pub fn resolved_path(&self) -> String {
        std::env::var(DB_ENV_VAR).unwrap_or_else(|_| self.path.clone())
    }
}
