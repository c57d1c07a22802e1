//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::billing::BillingError;
use tally_shared::AppError;
use tracing::error;

/// Renders a billing error as `{ "error": CODE, "message": ... }`.
///
/// The status comes from the error's [`AppError`] class. The code stays the
/// specific billing code. Server-side failures are logged and their details
/// withheld.
pub fn billing_error_response(err: BillingError) -> Response {
    let code = err.error_code();
    let message = err.to_string();
    let app = AppError::from(err);
    let status =
        StatusCode::from_u16(app.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = if app.is_client_error() {
        message
    } else {
        error!(error = %app, code, "Request failed");
        "An error occurred".to_string()
    };

    (
        status,
        Json(json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}

/// Response for a malformed path or query value.
pub(crate) fn bad_request(code: &'static str, message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": code,
            "message": message.into()
        })),
    )
        .into_response()
}
