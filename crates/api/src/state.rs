//! Application state
//!
//! Shared state for API handlers. The store handle is constructed once at
//! process start and passed in by the caller; handlers never initialize
//! connections lazily.

use std::sync::Arc;

use fleetsnap_core::InventoryStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Inventory store (schema guard + reconciliation + reads)
    pub store: Arc<InventoryStore>,
    /// Include driver error detail in 500 bodies (non-production mode)
    pub expose_error_detail: bool,
}

impl AppState {
    /// Create application state around an opened store
    pub fn new(store: InventoryStore) -> Self {
        Self {
            store: Arc::new(store),
            expose_error_detail: false,
        }
    }

    /// Enable driver error detail in 500 responses
    pub fn with_error_detail(mut self, expose: bool) -> Self {
        self.expose_error_detail = expose;
        self
    }
}
