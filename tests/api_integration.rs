//! Integration tests for the shop REST API
//!
//! These tests drive the full router against an in-memory catalog:
//! - Catalog loading, failure, retry and cancellation
//! - Listing with filters, sorting and the global search term
//! - Cart mutation, aggregates and checkout
//! - Session isolation

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot`

use shoppy_globe::catalog::{CatalogSource, Product, ProductId};
use shoppy_globe::error::FetchError;
use shoppy_globe::router::create_app_router;
use shoppy_globe::session::AppState;

// =============================================================================
// Test catalog
// =============================================================================

/// In-memory catalog that can fail its first loads or respond slowly
struct TestCatalog {
    products: Vec<Product>,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
    catalog_calls: AtomicUsize,
}

impl TestCatalog {
    fn new() -> Self {
        Self {
            products: sample_products(),
            failures_left: AtomicUsize::new(0),
            delay: None,
            catalog_calls: AtomicUsize::new(0),
        }
    }

    fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::new()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }
}

#[async_trait]
impl CatalogSource for TestCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<Product>, FetchError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(FetchError::Status {
                status: 503,
                reason: "Service Unavailable".into(),
            });
        }

        Ok(self.products.clone())
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Product, FetchError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(FetchError::NotFound(id))
    }
}

fn sample_products() -> Vec<Product> {
    serde_json::from_value(json!([
        { "id": 1, "title": "Red Shirt", "description": "Cotton shirt", "category": "clothing",
          "price": 20.0, "rating": 4.0, "stock": 5, "thumbnail": "https://cdn.example/1.png" },
        { "id": 2, "title": "Blue Shoes", "description": "Running shoes", "category": "footwear",
          "price": 50.0, "rating": 3.0, "stock": 5 },
        { "id": 7, "title": "Watch", "description": "Analog watch", "category": "accessories",
          "price": 9.99, "rating": 4.5, "stock": 3, "discountPercentage": 10.0 },
        { "id": 8, "title": "Case", "description": "Sleeve for your phone", "category": "accessories",
          "price": 12.0, "rating": 2.5, "stock": 0 }
    ]))
    .unwrap()
}

// =============================================================================
// Helpers
// =============================================================================

fn create_test_app(source: TestCatalog) -> (axum::Router, Arc<TestCatalog>) {
    let source = Arc::new(source);
    let state = Arc::new(AppState::new(source.clone()));
    (create_app_router(state), source)
}

/// Sends a request as `session` and returns the status and JSON body
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    session: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("shop_session={}", session));

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

fn product_ids(body: &Value) -> Vec<u64> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect()
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_new_visitor_gets_session_cookie() {
    let (app, _) = create_test_app(TestCatalog::new());

    let request = Request::builder()
        .method("GET")
        .uri("/cart")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("shop_session="));
}

#[tokio::test]
async fn test_listing_defaults_to_catalog_order() {
    let (app, source) = create_test_app(TestCatalog::new());

    let (status, body) = send(&app, "GET", "/catalog/products", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
    assert_eq!(product_ids(&body), vec![1, 2, 7, 8]);

    // Second listing reuses the session's catalog
    send(&app, "GET", "/catalog/products", "s1", None).await;
    assert_eq!(source.catalog_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listing_sorted_by_price_descending() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (status, body) = send(
        &app,
        "GET",
        "/catalog/products?search=&category=&minPrice=0&maxPrice=10000&sortBy=price-desc",
        "s1",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(product_ids(&body), vec![2, 1, 8, 7]);
    assert_eq!(body["products"][0]["title"], "Blue Shoes");
}

#[tokio::test]
async fn test_listing_filters_by_category_and_price() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (_, body) = send(
        &app,
        "GET",
        "/catalog/products?category=Accessories&maxPrice=10",
        "s1",
        None,
    )
    .await;
    assert_eq!(product_ids(&body), vec![7]);

    let (_, body) = send(&app, "GET", "/catalog/products?sortBy=name", "s1", None).await;
    assert_eq!(product_ids(&body), vec![2, 8, 1, 7]);
}

#[tokio::test]
async fn test_global_search_precedence() {
    let (app, _) = create_test_app(TestCatalog::new());

    // Whitespace-only global term falls back to the local field
    let (status, body) = send(&app, "PUT", "/search", "s1", Some(json!({ "term": "  " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (_, body) = send(&app, "GET", "/catalog/products?search=phone", "s1", None).await;
    assert_eq!(body["search"], "phone");
    assert_eq!(product_ids(&body), vec![8]);

    // A real global term overrides it
    send(&app, "PUT", "/search", "s1", Some(json!({ "term": "shoes" }))).await;
    let (_, body) = send(&app, "GET", "/catalog/products?search=phone", "s1", None).await;
    assert_eq!(body["search"], "shoes");
    assert_eq!(product_ids(&body), vec![2]);

    // Clearing restores the local field
    let (_, body) = send(&app, "DELETE", "/search", "s1", None).await;
    assert_eq!(body["term"], "");
    let (_, body) = send(&app, "GET", "/catalog/products?search=phone", "s1", None).await;
    assert_eq!(product_ids(&body), vec![8]);
}

#[tokio::test]
async fn test_categories() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (status, body) = send(&app, "GET", "/catalog/categories", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "value": "clothing", "label": "Clothing" },
            { "value": "footwear", "label": "Footwear" },
            { "value": "accessories", "label": "Accessories" }
        ])
    );
}

#[tokio::test]
async fn test_failed_load_is_reported_then_retried() {
    let (app, source) = create_test_app(TestCatalog::failing(1));

    let (status, body) = send(&app, "GET", "/catalog/products", "s1", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "catalog_unavailable");
    assert_eq!(
        body["error"]["message"],
        "HTTP error! status: 503 - Service Unavailable"
    );

    // The failure is not silently retried or replaced by an empty catalog
    let (_, body) = send(&app, "GET", "/catalog", "s1", None).await;
    assert_eq!(body["status"], "failed");
    assert!(body.get("count").is_none());

    let (status, body) = send(&app, "POST", "/catalog/reload", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "loaded");
    assert_eq!(body["count"], 4);
    assert_eq!(source.catalog_calls.load(Ordering::SeqCst), 2);

    let (status, body) = send(&app, "GET", "/catalog/products", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
}

#[tokio::test]
async fn test_cancelled_load_leaves_state_untouched() {
    let (app, _) = create_test_app(TestCatalog::slow(Duration::from_secs(30)));

    let listing = {
        let app = app.clone();
        tokio::spawn(async move { send(&app, "GET", "/catalog/products", "s1", None).await })
    };

    // Wait until the load is in flight
    let mut in_flight = false;
    for _ in 0..100 {
        let (_, body) = send(&app, "GET", "/catalog", "s1", None).await;
        if body["status"] == "loading" {
            in_flight = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(in_flight);

    let (status, body) = send(&app, "DELETE", "/catalog/fetch", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");

    let (status, body) = listing.await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "catalog_not_loaded");
}

#[tokio::test]
async fn test_product_detail() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (status, body) = send(&app, "GET", "/catalog/products/7", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Watch");
    assert_eq!(body["discountPercentage"], 10.0);

    let (status, body) = send(&app, "GET", "/catalog/products/404", "s1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Product not found");
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_add_same_product_twice() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (status, body) = send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 7 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 1);
    assert_eq!(body["totalPrice"], 9.99);

    let (_, body) = send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 7 }))).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["totalPrice"], 19.98);
}

#[tokio::test]
async fn test_quantity_changes() {
    let (app, _) = create_test_app(TestCatalog::new());
    send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 1 }))).await;
    send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 2 }))).await;

    let (_, body) = send(&app, "PUT", "/cart/items/1", "s1", Some(json!({ "quantity": 3 }))).await;
    assert_eq!(body["totalItems"], 4);
    assert_eq!(body["totalPrice"], 110.0);

    // Below-one quantities are ignored
    let (status, body) = send(&app, "PUT", "/cart/items/1", "s1", Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["quantity"], 3);

    send(&app, "POST", "/cart/items/2/increment", "s1", None).await;
    for _ in 0..3 {
        send(&app, "POST", "/cart/items/2/decrement", "s1", None).await;
    }
    let (_, body) = send(&app, "GET", "/cart", "s1", None).await;
    assert_eq!(body["items"][1]["id"], 2);
    assert_eq!(body["items"][1]["quantity"], 1);

    let (_, body) = send(&app, "DELETE", "/cart/items/1", "s1", None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalItems"], 1);
    assert_eq!(body["totalPrice"], 50.0);

    // Unknown ids are absorbed
    let (status, _) = send(&app, "DELETE", "/cart/items/99", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_zero_stock_product_is_still_added() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (status, body) = send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 8 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 1);
    assert_eq!(body["totalPrice"], 12.0);
    assert_eq!(body["items"][0]["id"], 8);
}

#[tokio::test]
async fn test_add_unknown_product() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (status, body) = send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 404 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "unknown_product");
}

#[tokio::test]
async fn test_add_with_invalid_body() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (status, body) = send(&app, "POST", "/cart/items", "s1", Some(json!({ "name": "Apple" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn test_checkout_clears_cart() {
    let (app, _) = create_test_app(TestCatalog::new());
    send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 1 }))).await;
    send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 7 }))).await;

    let (status, body) = send(&app, "POST", "/checkout", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "checked_out");
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/cart", "s1", None).await;
    assert_eq!(body["totalItems"], 0);
    assert_eq!(body["totalPrice"], 0.0);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (app, _) = create_test_app(TestCatalog::new());

    send(&app, "POST", "/cart/items", "alice", Some(json!({ "productId": 1 }))).await;
    send(&app, "PUT", "/search", "alice", Some(json!({ "term": "shirt" }))).await;

    let (_, body) = send(&app, "GET", "/cart", "bob", None).await;
    assert_eq!(body["totalItems"], 0);

    let (_, body) = send(&app, "GET", "/catalog/products", "bob", None).await;
    assert_eq!(body["count"], 4);

    let (_, body) = send(&app, "GET", "/catalog/products", "alice", None).await;
    assert_eq!(product_ids(&body), vec![1]);
}

#[tokio::test]
async fn test_ending_session_forgets_cart() {
    let (app, _) = create_test_app(TestCatalog::new());
    send(&app, "POST", "/cart/items", "s1", Some(json!({ "productId": 1 }))).await;

    let (status, body) = send(&app, "DELETE", "/session", "s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ended"], true);

    let (_, body) = send(&app, "GET", "/cart", "s1", None).await;
    assert_eq!(body["totalItems"], 0);

    let (_, body) = send(&app, "DELETE", "/session", "unknown", None).await;
    assert_eq!(body["ended"], false);
}

#[tokio::test]
async fn test_bad_listing_query_returns_json_error() {
    let (app, _) = create_test_app(TestCatalog::new());

    let (status, body) = send(&app, "GET", "/catalog/products?minPrice=abc", "s1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

// =============================================================================
// Session lifetime
// =============================================================================

#[tokio::test]
async fn test_reads_do_not_store_sessions() {
    let state = Arc::new(AppState::new(Arc::new(TestCatalog::new())));
    let app = create_app_router(state.clone());

    for _ in 0..50 {
        let request = Request::builder()
            .method("GET")
            .uri("/cart")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    for uri in ["/catalog", "/search"] {
        let (status, _) = send(&app, "GET", uri, "reader", None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, body) = send(&app, "POST", "/checkout", "reader", None).await;
    assert_eq!(body["totalItems"], 0);
    send(&app, "DELETE", "/search", "reader", None).await;
    assert_eq!(state.sessions.len(), 0);

    send(&app, "POST", "/cart/items", "buyer", Some(json!({ "productId": 1 }))).await;
    assert_eq!(state.sessions.len(), 1);

    let (_, body) = send(&app, "GET", "/cart", "buyer", None).await;
    assert_eq!(body["totalItems"], 1);
}
