//! Item routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tally_core::stock::{ItemUpdate, ItemView, NewItem};
use tally_core::store::LedgerStore;
use tally_shared::types::ItemId;

use crate::{AppState, billing_error_response};

/// Creates the item routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/items", get(list_items::<S>).post(create_item::<S>))
        .route(
            "/items/{item_id}",
            get(get_item::<S>)
                .patch(update_item::<S>)
                .delete(delete_item::<S>),
        )
}

/// GET `/items` - List items, universal item first, with stock status.
async fn list_items<S: LedgerStore>(State(state): State<AppState<S>>) -> Response {
    match state.items.list().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// POST `/items` - Create an item.
async fn create_item<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<NewItem>,
) -> Response {
    match state.items.create(payload).await {
        Ok(item) => (StatusCode::CREATED, Json(ItemView::from(item))).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// GET `/items/{item_id}` - Get one item.
async fn get_item<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(item_id): Path<ItemId>,
) -> Response {
    match state.items.get(item_id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// PATCH `/items/{item_id}` - Edit an item or correct its stock.
async fn update_item<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(item_id): Path<ItemId>,
    Json(payload): Json<ItemUpdate>,
) -> Response {
    match state.items.update(item_id, payload).await {
        Ok(item) => Json(ItemView::from(item)).into_response(),
        Err(e) => billing_error_response(e),
    }
}

/// DELETE `/items/{item_id}` - Delete an item. The universal item is protected.
async fn delete_item<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(item_id): Path<ItemId>,
) -> Response {
    match state.items.delete(item_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => billing_error_response(e),
    }
}
