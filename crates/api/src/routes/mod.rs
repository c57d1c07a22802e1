//! API route definitions.

use axum::Router;
use tally_core::store::LedgerStore;

use crate::AppState;

pub mod company;
pub mod health;
pub mod items;
pub mod numbers;
pub mod parties;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes())
        .merge(parties::routes())
        .merge(items::routes())
        .merge(transactions::routes())
        .merge(numbers::routes())
        .merge(company::routes())
}
