//! Sales, purchases, and payments routes.
//!
//! The three kinds share list, get, delete, and bulk delete handlers; only
//! create and update differ in their input.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::billing::{BillingError, TransactionOutcome};
use tally_core::records::{PaymentInput, RecordFilter, TradeInput, TransactionKind};
use tally_core::store::LedgerStore;
use tally_shared::types::{PageRequest, PartyId, TransactionId};

use crate::{AppState, billing_error_response};

/// Creates the sales, purchases, and payments routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(sales_routes())
        .merge(purchases_routes())
        .merge(payments_routes())
}

fn sales_routes<S: LedgerStore>() -> Router<AppState<S>> {
    shared_routes("/sales", TransactionKind::Sale)
        .route(
            "/sales",
            post(
                |State(state): State<AppState<S>>, Json(input): Json<TradeInput>| async move {
                    outcome_response(StatusCode::CREATED, state.billing.create_sale(input).await)
                },
            ),
        )
        .route(
            "/sales/{id}",
            put(
                |State(state): State<AppState<S>>,
                 Path(id): Path<TransactionId>,
                 Json(input): Json<TradeInput>| async move {
                    outcome_response(StatusCode::OK, state.billing.update_sale(id, input).await)
                },
            ),
        )
}

fn purchases_routes<S: LedgerStore>() -> Router<AppState<S>> {
    shared_routes("/purchases", TransactionKind::Purchase)
        .route(
            "/purchases",
            post(
                |State(state): State<AppState<S>>, Json(input): Json<TradeInput>| async move {
                    outcome_response(
                        StatusCode::CREATED,
                        state.billing.create_purchase(input).await,
                    )
                },
            ),
        )
        .route(
            "/purchases/{id}",
            put(
                |State(state): State<AppState<S>>,
                 Path(id): Path<TransactionId>,
                 Json(input): Json<TradeInput>| async move {
                    outcome_response(
                        StatusCode::OK,
                        state.billing.update_purchase(id, input).await,
                    )
                },
            ),
        )
}

fn payments_routes<S: LedgerStore>() -> Router<AppState<S>> {
    shared_routes("/payments", TransactionKind::Payment)
        .route(
            "/payments",
            post(
                |State(state): State<AppState<S>>, Json(input): Json<PaymentInput>| async move {
                    outcome_response(
                        StatusCode::CREATED,
                        state.billing.create_payment(input).await,
                    )
                },
            ),
        )
        .route(
            "/payments/{id}",
            put(
                |State(state): State<AppState<S>>,
                 Path(id): Path<TransactionId>,
                 Json(input): Json<PaymentInput>| async move {
                    outcome_response(
                        StatusCode::OK,
                        state.billing.update_payment(id, input).await,
                    )
                },
            ),
        )
}

/// List, get, delete, and bulk delete under `base`.
fn shared_routes<S: LedgerStore>(base: &str, kind: TransactionKind) -> Router<AppState<S>> {
    Router::new()
        .route(
            base,
            get(
                move |state: State<AppState<S>>, query: Query<ListQuery>| {
                    list_records(state, query, kind)
                },
            ),
        )
        .route(
            &format!("{base}/{{id}}"),
            get(move |state: State<AppState<S>>, id: Path<TransactionId>| {
                get_record(state, id, kind)
            })
            .delete(move |state: State<AppState<S>>, id: Path<TransactionId>| {
                delete_record(state, id, kind)
            }),
        )
        .route(
            &format!("{base}/bulk-delete"),
            post(
                move |state: State<AppState<S>>, body: Json<BulkDeleteRequest>| {
                    bulk_delete(state, body, kind)
                },
            ),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing records.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Filter by party.
    pub party_id: Option<PartyId>,
    /// Filter by date range start (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Filter by date range end (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u32>,
}

/// Request body for bulk delete.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    /// Records to delete.
    pub ids: Vec<TransactionId>,
}

// ============================================================================
// Route Handlers
// ============================================================================

fn outcome_response(status: StatusCode, result: Result<TransactionOutcome, BillingError>) -> Response {
    match result {
        Ok(outcome) => (status, Json(outcome)).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// GET `/{kind}` - Paginated list, newest first.
async fn list_records<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
    kind: TransactionKind,
) -> Response {
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query.per_page.unwrap_or(defaults.per_page),
    );
    let filter = RecordFilter {
        kind: Some(kind),
        party_id: query.party_id,
        date_from: query.from,
        date_to: query.to,
    };

    match state.billing.list(kind, filter, page).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// GET `/{kind}/{id}` - Get one record.
async fn get_record<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<TransactionId>,
    kind: TransactionKind,
) -> Response {
    match state.billing.get(kind, id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// DELETE `/{kind}/{id}` - Delete a record and reverse its effects.
async fn delete_record<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<TransactionId>,
    kind: TransactionKind,
) -> Response {
    match state.billing.delete(kind, id).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// POST `/{kind}/bulk-delete` - Delete many; failures are reported per ID.
async fn bulk_delete<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<BulkDeleteRequest>,
    kind: TransactionKind,
) -> Response {
    let report = state.billing.bulk_delete(kind, &payload.ids).await;
    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (status, Json(report)).into_response()
}
