//! API routes

pub mod inventory;
pub mod ops;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(ops::routes())
        .merge(inventory::routes())
        .with_state(state)
}
