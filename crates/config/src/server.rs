//! HTTP server configuration

use std::net::SocketAddr;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Server configuration
///
/// # Example
///
/// ```toml
/// [server]
/// bind = "127.0.0.1:3000"
/// expose_error_detail = false
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    /// Default: 127.0.0.1:3000
    pub bind: String,

    /// Include driver error detail in 500 responses (development only)
    /// Default: false
    pub expose_error_detail: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            expose_error_detail: false,
        }
    }
}

impl ServerConfig {
    /// Check that the bind address is a valid socket address
    pub fn validate(&self) -> Result<()> {
        self.bind
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid_value("server.bind", e.to_string()))?;
        Ok(())
    }
}
