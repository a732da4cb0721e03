//! Operations routes (no auth)

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::state::AppState;

/// Operations routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/healthz", get(health))
}

/// Liveness probe
///
/// GET /healthz
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
