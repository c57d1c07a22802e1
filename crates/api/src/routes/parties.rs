//! Party routes.
//!
//! Balances are read-only here; only transactions move them.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tally_core::ledger::{NewParty, PartyUpdate};
use tally_core::store::LedgerStore;
use tally_shared::types::PartyId;

use crate::{AppState, billing_error_response};

/// Creates the party routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/parties", get(list_parties::<S>).post(create_party::<S>))
        .route("/parties/search", get(search_parties::<S>))
        .route(
            "/parties/{party_id}",
            get(get_party::<S>)
                .patch(update_party::<S>)
                .delete(delete_party::<S>),
        )
}

/// Query parameters for party search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Substring of the name or phone.
    #[serde(default)]
    pub q: String,
}

/// GET `/parties` - List all parties sorted by name.
async fn list_parties<S: LedgerStore>(State(state): State<AppState<S>>) -> Response {
    match state.parties.list().await {
        Ok(parties) => Json(parties).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// GET `/parties/search?q=` - Case-insensitive search on name or phone.
async fn search_parties<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match state.parties.search(&query.q).await {
        Ok(parties) => Json(parties).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// POST `/parties` - Create a party with a zero balance.
async fn create_party<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<NewParty>,
) -> Response {
    match state.parties.create(payload).await {
        Ok(party) => (StatusCode::CREATED, Json(party)).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// GET `/parties/{party_id}` - Get one party.
async fn get_party<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(party_id): Path<PartyId>,
) -> Response {
    match state.parties.get(party_id).await {
        Ok(party) => Json(party).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// PATCH `/parties/{party_id}` - Update contact details.
async fn update_party<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(party_id): Path<PartyId>,
    Json(payload): Json<PartyUpdate>,
) -> Response {
    match state.parties.update(party_id, payload).await {
        Ok(party) => Json(party).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// DELETE `/parties/{party_id}` - Delete a party no transaction references.
async fn delete_party<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(party_id): Path<PartyId>,
) -> Response {
    match state.parties.delete(party_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => billing_error_response(e),
    }
}
