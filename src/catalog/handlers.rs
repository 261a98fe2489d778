//! REST API handlers for catalog browsing
//!
//! This module implements HTTP endpoints for the product listing, category
//! selector, product detail and the session's global search term.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

use super::{
    models::*,
    query::{categories, effective_search, QueryCriteria},
    search::GlobalSearchTerm,
    source::FetchState,
};
use crate::error::{ApiError, ApiResult};
use crate::session::{resolve_session_id, with_session_cookie, SharedState};

/// Creates routes for catalog-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/catalog", get(catalog_status))
        .route("/catalog/products", get(list_products))
        .route("/catalog/products/:id", get(product_detail))
        .route("/catalog/categories", get(list_categories))
        .route("/catalog/reload", post(reload_catalog))
        .route("/catalog/fetch", delete(cancel_fetch))
        .route(
            "/search",
            get(get_search).put(set_search).delete(clear_search),
        )
}

fn status_of(state: &FetchState<std::sync::Arc<Catalog>>) -> CatalogStatusResponse {
    CatalogStatusResponse {
        status: state.label().to_string(),
        count: state.loaded().map(|catalog| catalog.len()),
        error: state.error().map(str::to_string),
    }
}

/// Endpoint: GET /catalog
/// Reports the catalog load state without triggering a fetch.
async fn catalog_status(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = resolve_session_id(&headers);
    let status = state.read_session(&session_id, |s| status_of(s.catalog.state()));
    with_session_cookie(Json(status).into_response(), &session_id, is_new)
}

/// Endpoint: GET /catalog/products
/// Returns the filtered, sorted listing. Loads the catalog on first use.
async fn list_products(
    State(state): State<SharedState>,
    headers: HeaderMap,
    query: Result<Query<QueryCriteria>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(criteria) = query.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let (session_id, is_new) = resolve_session_id(&headers);
    state.ensure_catalog(&session_id).await;

    let listing = state.with_session(&session_id, |s| {
        let catalog = s.loaded_catalog()?.clone();
        let products: Vec<Product> = s
            .query_cache
            .view(&catalog, &criteria, &s.search)
            .into_iter()
            .cloned()
            .collect();

        Ok::<_, ApiError>(ProductListResponse {
            count: products.len(),
            search: effective_search(&s.search, &criteria.search).to_string(),
            products,
        })
    })?;

    Ok(with_session_cookie(
        Json(listing).into_response(),
        &session_id,
        is_new,
    ))
}

/// Endpoint: GET /catalog/products/:id
/// Fetches a single product for the detail view.
async fn product_detail(
    State(state): State<SharedState>,
    Path(id): Path<ProductId>,
) -> ApiResult<Json<Product>> {
    let product = state.source.fetch_product(id).await?;
    Ok(Json(product))
}

/// Endpoint: GET /catalog/categories
/// Lists the distinct categories of the loaded catalog.
async fn list_categories(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let (session_id, is_new) = resolve_session_id(&headers);
    state.ensure_catalog(&session_id).await;

    let options = state.with_session(&session_id, |s| {
        s.loaded_catalog()
            .map(|catalog| categories(catalog.products()))
    })?;

    Ok(with_session_cookie(
        Json(options).into_response(),
        &session_id,
        is_new,
    ))
}

/// Endpoint: POST /catalog/reload
/// Discards whatever the session holds and fetches the catalog again.
async fn reload_catalog(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = resolve_session_id(&headers);
    state.load_catalog(&session_id).await;

    let status = state.read_session(&session_id, |s| status_of(s.catalog.state()));
    with_session_cookie(Json(status).into_response(), &session_id, is_new)
}

/// Endpoint: DELETE /catalog/fetch
/// Called when the listing view goes away; abandons an in-flight load.
async fn cancel_fetch(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = resolve_session_id(&headers);
    let cancelled = state.cancel_catalog_load(&session_id);
    if cancelled {
        tracing::debug!(session_id = %session_id, "catalog fetch cancelled");
    }

    let status = state.read_session(&session_id, |s| status_of(s.catalog.state()));
    with_session_cookie(Json(status).into_response(), &session_id, is_new)
}

fn search_response(search: &GlobalSearchTerm) -> SearchTermResponse {
    SearchTermResponse {
        term: search.get().to_string(),
        active: search.active().is_some(),
    }
}

/// Endpoint: GET /search
async fn get_search(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = resolve_session_id(&headers);
    let body = state.read_session(&session_id, |s| search_response(&s.search));
    with_session_cookie(Json(body).into_response(), &session_id, is_new)
}

/// Endpoint: PUT /search
/// Stores the term submitted from the header search box.
async fn set_search(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<SearchTermInput>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let (session_id, is_new) = resolve_session_id(&headers);

    let body = state.with_session(&session_id, |s| {
        s.search.set(input.term);
        search_response(&s.search)
    });

    Ok(with_session_cookie(
        Json(body).into_response(),
        &session_id,
        is_new,
    ))
}

/// Endpoint: DELETE /search
async fn clear_search(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = resolve_session_id(&headers);
    let body = state
        .update_session(&session_id, |s| {
            s.search.clear();
            search_response(&s.search)
        })
        .unwrap_or_else(|| search_response(&GlobalSearchTerm::default()));
    with_session_cookie(Json(body).into_response(), &session_id, is_new)
}
