//! Reference number routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tally_core::numbering::NumberScope;
use tally_core::store::LedgerStore;
use tally_shared::types::TransactionId;

use crate::error::bad_request;
use crate::{AppState, billing_error_response};

/// Creates the numbering routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/numbers/{scope}/next", get(next_number::<S>))
        .route("/numbers/{scope}/available", get(number_available::<S>))
}

/// Query parameters for the availability check.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Candidate number.
    pub number: String,
    /// Record being edited, whose own number counts as free.
    pub excluding: Option<TransactionId>,
}

/// Suggested next number.
#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    /// The suggestion.
    pub number: String,
}

/// Availability answer.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Number checked.
    pub number: String,
    /// Whether it can be used.
    pub available: bool,
}

fn parse_scope(scope: &str) -> Result<NumberScope, Response> {
    NumberScope::from_str(scope).map_err(|msg| bad_request("INVALID_SCOPE", msg))
}

/// GET `/numbers/{scope}/next` - Suggest the next free number.
async fn next_number<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(scope): Path<String>,
) -> Response {
    let scope = match parse_scope(&scope) {
        Ok(scope) => scope,
        Err(response) => return response,
    };

    match state.billing.suggest_next_number(scope).await {
        Ok(number) => Json(NextNumberResponse { number }).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// GET `/numbers/{scope}/available?number=` - Check a candidate number.
async fn number_available<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(scope): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Response {
    let scope = match parse_scope(&scope) {
        Ok(scope) => scope,
        Err(response) => return response,
    };

    match state
        .billing
        .is_number_available(scope, &query.number, query.excluding)
        .await
    {
        Ok(available) => Json(AvailabilityResponse {
            number: query.number.trim().to_string(),
            available,
        })
        .into_response(),
        Err(e) => billing_error_response(e),
    }
}
