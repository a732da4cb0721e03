//! Store error types

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the inventory store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or incomplete input; never retried
    #[error("validation error: {0}")]
    Validation(String),

    /// DDL failure while creating the schema; terminal
    #[error("schema error: {0}")]
    Schema(String),

    /// Database failure during a read or write; terminal unless the
    /// missing-table recovery path applies
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Statement exceeded the per-operation deadline
    #[error("persistence timeout after {0:?}")]
    Timeout(Duration),

    /// No record stored for the given user
    #[error("inventory record not found for user {user_id}")]
    NotFound { user_id: String },
}

impl StoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a not found error
    pub fn not_found(user_id: impl Into<String>) -> Self {
        Self::NotFound {
            user_id: user_id.into(),
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
