//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for parties, items, sales, purchases, and payments
//! - Number suggestion and availability checks
//! - JSON error responses derived from [`BillingError`]
//!
//! Handlers are generic over the [`LedgerStore`], so the same router runs
//! against Postgres in the server and against the in-memory store in tests.

mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tally_core::billing::BillingService;
use tally_core::ledger::PartyDirectory;
use tally_core::stock::ItemCatalog;
use tally_core::store::LedgerStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::billing_error_response;

/// Application state shared across handlers.
pub struct AppState<S: LedgerStore> {
    /// Sales, purchases, and payments.
    pub billing: BillingService<S>,
    /// Party CRUD.
    pub parties: Arc<PartyDirectory<S>>,
    /// Item CRUD.
    pub items: Arc<ItemCatalog<S>>,
}

impl<S: LedgerStore> AppState<S> {
    /// Builds the state around one shared store.
    #[must_use]
    pub fn new(store: &Arc<S>, billing: BillingService<S>) -> Self {
        Self {
            billing,
            parties: Arc::new(PartyDirectory::new(Arc::clone(store))),
            items: Arc::new(ItemCatalog::new(Arc::clone(store))),
        }
    }
}

impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            billing: self.billing.clone(),
            parties: Arc::clone(&self.parties),
            items: Arc::clone(&self.items),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
