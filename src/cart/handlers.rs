//! REST API handlers for shopping cart operations
//!
//! This module implements HTTP endpoints for cart mutation, the cart
//! aggregates and checkout. Every endpoint answers with the resulting cart so
//! the caller never has to recompute totals itself.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use super::{helpers::*, models::*, store::CartStore};
use crate::catalog::models::ProductId;
use crate::error::{ApiError, ApiResult};
use crate::session::{resolve_session_id, with_session_cookie, SharedState};

/// Creates routes for cart-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:id", put(set_quantity).delete(remove_item))
        .route("/cart/items/:id/increment", post(increment))
        .route("/cart/items/:id/decrement", post(decrement))
        .route("/checkout", post(checkout))
}

/// Applies `op` to the session's cart and responds with the resulting cart.
fn apply_to_cart(
    state: &SharedState,
    (session_id, is_new): (String, bool),
    op: impl FnOnce(&mut CartStore),
) -> Response {
    let snapshot = state.with_session(&session_id, |s| {
        op(&mut s.cart);
        s.cart.snapshot()
    });
    with_session_cookie(Json(snapshot).into_response(), &session_id, is_new)
}

/// Endpoint: GET /cart
async fn get_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = resolve_session_id(&headers);
    let snapshot = state.read_session(&session_id, |s| s.cart.snapshot());
    with_session_cookie(Json(snapshot).into_response(), &session_id, is_new)
}

/// Endpoint: POST /cart/items
/// Adds one unit of a product, whatever its stock.
async fn add_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<AddItemInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let session = resolve_session_id(&headers);

    let product = state.find_product(&session.0, input.product_id).await?;

    Ok(apply_to_cart(&state, session, |cart| cart.add_item(&product)))
}

/// Endpoint: PUT /cart/items/:id
async fn set_quantity(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
    payload: Result<Json<SetQuantityInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    Ok(apply_to_cart(&state, resolve_session_id(&headers), |cart| {
        cart.set_quantity(id, input.quantity)
    }))
}

/// Endpoint: POST /cart/items/:id/increment
async fn increment(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Response {
    apply_to_cart(&state, resolve_session_id(&headers), |cart| cart.increment_quantity(id))
}

/// Endpoint: POST /cart/items/:id/decrement
async fn decrement(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Response {
    apply_to_cart(&state, resolve_session_id(&headers), |cart| cart.decrement_quantity(id))
}

/// Endpoint: DELETE /cart/items/:id
async fn remove_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Response {
    apply_to_cart(&state, resolve_session_id(&headers), |cart| cart.remove_item(id))
}

/// Endpoint: POST /checkout
/// Places the order: empties the cart and returns what was in it.
async fn checkout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = resolve_session_id(&headers);

    let order = state
        .update_session(&session_id, |s| {
            let order = s.cart.snapshot();
            s.cart.clear();
            order
        })
        .unwrap_or_else(|| CartStore::new().snapshot());

    if order.items.is_empty() {
        tracing::info!(session_id = %session_id, "checkout of empty cart");
    } else {
        tracing::info!(
            session_id = %session_id,
            total = %format_price(order.total_price),
            "checked out: {}",
            format_item_summary(&order.items)
        );
    }

    let response = Json(CheckoutResponse {
        status: "checked_out".to_string(),
        order,
    });
    with_session_cookie(response.into_response(), &session_id, is_new)
}
