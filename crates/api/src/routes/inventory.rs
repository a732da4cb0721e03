//! Inventory endpoints
//!
//! The single write entry point plus the read surface consumed by the
//! dashboard and the export path.
//!
//! | Endpoint | Auth |
//! |----------|------|
//! | `POST /api/pc-info` | userId in body |
//! | `GET /api/pc-info` | `x-user-id` header |
//! | `GET /api/pc-info?all=true` | none (admin export) |

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{ListInventoryResponse, SubmitInventoryRequest, SubmitInventoryResponse};

/// Header carrying the authenticated caller's identity, set by the shell
/// after the identity-provider flow completes.
const USER_ID_HEADER: &str = "x-user-id";

/// Inventory routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/pc-info", get(fetch_inventory).post(submit_inventory))
}

/// Reconcile a submitted snapshot into the store
///
/// POST /api/pc-info
async fn submit_inventory(
    State(state): State<AppState>,
    Json(req): Json<SubmitInventoryRequest>,
) -> Result<(StatusCode, Json<SubmitInventoryResponse>), ApiError> {
    let record = req.into_record();

    let outcome = state
        .store
        .upsert(&record)
        .await
        .map_err(|e| ApiError::from_store(e, state.expose_error_detail))?;

    info!(
        user_id = %outcome.user_id,
        inserted = outcome.inserted,
        "Inventory snapshot reconciled"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitInventoryResponse {
            message: "inventory record stored".to_string(),
            user_id: outcome.user_id,
        }),
    ))
}

/// Query parameters for the read surface
#[derive(Debug, Deserialize)]
struct FetchParams {
    /// `all=true` selects the unauthenticated export path
    #[serde(default)]
    all: Option<String>,
}

/// Fetch the caller's record, or every record with `all=true`
///
/// GET /api/pc-info
async fn fetch_inventory(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if params.all.as_deref() == Some("true") {
        let data = state
            .store
            .list_all()
            .await
            .map_err(|e| ApiError::from_store(e, state.expose_error_detail))?;

        let count = data.len();
        return Ok(Json(ListInventoryResponse { data, count }).into_response());
    }

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let record = state
        .store
        .get(user_id)
        .await
        .map_err(|e| ApiError::from_store(e, state.expose_error_detail))?;

    Ok(Json(record).into_response())
}
