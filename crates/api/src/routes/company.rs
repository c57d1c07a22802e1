//! Company profile routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tally_core::store::LedgerStore;
use tracing::{info, warn};

use crate::AppState;

/// Creates the company routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/company", get(get_company::<S>))
        .route("/company/invalidate", post(invalidate_company::<S>))
}

/// GET `/company` - The profile printed on documents.
async fn get_company<S: LedgerStore>(State(state): State<AppState<S>>) -> Response {
    match state.billing.dispatcher().company().profile().await {
        Ok(profile) => Json(profile.as_ref().clone()).into_response(),
        Err(e) => {
            warn!(error = %e, "Company profile unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "COMPANY_UNAVAILABLE",
                    "message": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

/// POST `/company/invalidate` - Drop the cached profile after it changed.
async fn invalidate_company<S: LedgerStore>(State(state): State<AppState<S>>) -> StatusCode {
    state.billing.dispatcher().company().invalidate();
    info!("Company profile cache invalidated");
    StatusCode::NO_CONTENT
}
