//! Fleetsnap API
//!
//! HTTP surface for inventory sync, built on Axum over `fleetsnap-core`.
//!
//! # Endpoints
//!
//! - `POST /api/pc-info` - reconcile a submitted snapshot (201 on success)
//! - `GET /api/pc-info` - fetch the caller's record (`x-user-id` header)
//! - `GET /api/pc-info?all=true` - export every record (admin path)
//! - `GET /healthz` - liveness
//!
//! # Usage
//!
//! ```ignore
//! use fleetsnap_api::{build_router, AppState};
//! use fleetsnap_core::InventoryStore;
//!
//! let store = InventoryStore::open("data/fleetsnap.db").await?;
//! let app = build_router(AppState::new(store));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

// Re-exports
pub use error::{ApiError, ErrorResponse, Result};
pub use routes::build_router;
pub use state::AppState;
pub use types::{ListInventoryResponse, SubmitInventoryRequest, SubmitInventoryResponse};
