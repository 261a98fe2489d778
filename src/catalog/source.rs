//! Remote catalog access
//!
//! `CatalogSource` is the seam to the HTTP service that owns the product
//! data. `DummyJsonSource` talks to a dummyjson-compatible API; tests plug in
//! in-memory sources.
//!
//! ## Load lifecycle
//! ```text
//!            begin()                 finish(Completed(Ok))
//!   Idle ─────────────► Loading ─────────────────────────► Loaded
//!    ▲                    │  │      finish(Completed(Err))
//!    │   cancel() /       │  └───────────────────────────► Failed ──┐
//!    └── finish(Cancelled)┘                                          │
//!                         ▲              begin() (retry)             │
//!                         └──────────────────────────────────────────┘
//! ```
//! A cancelled load puts back whatever state was there before `begin()`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::{future::Future, time::Duration};
use tokio_util::sync::CancellationToken;

use super::models::{Product, ProductId};
use crate::error::FetchError;

// =============================================================================
// Source trait
// =============================================================================

/// Supplier of product data.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the full catalog, in the service's order.
    async fn fetch_catalog(&self) -> Result<Vec<Product>, FetchError>;

    /// Fetches a single product by identifier.
    async fn fetch_product(&self, id: ProductId) -> Result<Product, FetchError>;
}

/// `CatalogSource` backed by a dummyjson-style REST API.
#[derive(Debug, Clone)]
pub struct DummyJsonSource {
    client: Client,
    base_url: String,
}

impl DummyJsonSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        Ok(response.json::<Value>().await?)
    }
}

fn status_error(status: StatusCode) -> FetchError {
    FetchError::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    }
}

#[async_trait]
impl CatalogSource for DummyJsonSource {
    async fn fetch_catalog(&self) -> Result<Vec<Product>, FetchError> {
        // limit=0 asks for every product instead of the first page
        let url = format!("{}/products?limit=0", self.base_url);
        let body = self.get_json(&url).await?;
        parse_catalog(body)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Product, FetchError> {
        let url = format!("{}/products/{}", self.base_url, id);
        match self.get_json(&url).await {
            Err(FetchError::Status { status: 404, .. }) => Err(FetchError::NotFound(id)),
            Err(err) => Err(err),
            Ok(body) => parse_product(id, body),
        }
    }
}

/// Reads a `{ "products": [...] }` envelope.
///
/// A missing `products` key is an empty catalog; anything that is not an
/// object is malformed.
pub fn parse_catalog(body: Value) -> Result<Vec<Product>, FetchError> {
    let Value::Object(mut envelope) = body else {
        return Err(FetchError::Malformed("expected a JSON object".into()));
    };

    match envelope.remove("products") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(products) => {
            serde_json::from_value(products).map_err(|e| FetchError::Malformed(e.to_string()))
        }
    }
}

/// Reads a single product record; a record without `id` means not found.
pub fn parse_product(id: ProductId, body: Value) -> Result<Product, FetchError> {
    if !body.is_object() {
        return Err(FetchError::Malformed("expected a JSON object".into()));
    }
    if body.get("id").map_or(true, Value::is_null) {
        return Err(FetchError::NotFound(id));
    }

    serde_json::from_value(body).map_err(|e| FetchError::Malformed(e.to_string()))
}

// =============================================================================
// Cancellation
// =============================================================================

/// Result of a fetch raced against its cancellation token.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Completed(Result<T, FetchError>),
    Cancelled,
}

impl<T> FetchOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Completed(result) => FetchOutcome::Completed(result.map(f)),
            FetchOutcome::Cancelled => FetchOutcome::Cancelled,
        }
    }
}

/// Drives `fetch` unless `token` is cancelled first.
///
/// A result that arrives after cancellation is discarded as well.
pub async fn fetch_with_cancel<T, F>(token: &CancellationToken, fetch: F) -> FetchOutcome<T>
where
    F: Future<Output = Result<T, FetchError>>,
{
    let result = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        result = fetch => Some(result),
    };

    match result {
        Some(result) if !token.is_cancelled() => FetchOutcome::Completed(result),
        _ => {
            tracing::debug!("request was cancelled");
            FetchOutcome::Cancelled
        }
    }
}

// =============================================================================
// Fetch state
// =============================================================================

/// What the caller knows about a remote resource.
///
/// `Idle` and `Loading` mean "no data yet"; `Failed` carries the message to
/// show next to a retry control. Neither is ever an empty `Loaded`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::Idle
    }
}

impl<T> FetchState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Short label used in API payloads.
    pub fn label(&self) -> &'static str {
        match self {
            FetchState::Idle => "idle",
            FetchState::Loading => "loading",
            FetchState::Loaded(_) => "loaded",
            FetchState::Failed(_) => "failed",
        }
    }
}

/// Handle for one in-flight load, returned by [`FetchSlot::begin`].
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    token: CancellationToken,
}

impl FetchTicket {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug)]
struct Pending<T> {
    generation: u64,
    token: CancellationToken,
    previous: FetchState<T>,
}

/// A `FetchState` together with the bookkeeping of its in-flight load.
///
/// Only the most recent `begin()` may complete the load; older tickets are
/// cancelled when superseded and their results are dropped.
#[derive(Debug)]
pub struct FetchSlot<T> {
    state: FetchState<T>,
    pending: Option<Pending<T>>,
    generation: u64,
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        Self {
            state: FetchState::Idle,
            pending: None,
            generation: 0,
        }
    }
}

impl<T> FetchSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Starts a load from scratch, superseding any load in flight.
    pub fn begin(&mut self) -> FetchTicket {
        let previous = match self.pending.take() {
            Some(pending) => {
                pending.token.cancel();
                pending.previous
            }
            None => std::mem::replace(&mut self.state, FetchState::Loading),
        };

        self.generation += 1;
        let token = CancellationToken::new();
        self.pending = Some(Pending {
            generation: self.generation,
            token: token.clone(),
            previous,
        });
        self.state = FetchState::Loading;

        FetchTicket {
            generation: self.generation,
            token,
        }
    }

    /// Cancels the load in flight and restores the state it replaced.
    ///
    /// Returns false when nothing was in flight.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.token.cancel();
                self.state = pending.previous;
                true
            }
            None => false,
        }
    }

    /// Applies the outcome of the load identified by `ticket`.
    ///
    /// Returns false when the outcome was discarded.
    pub fn finish(&mut self, ticket: &FetchTicket, outcome: FetchOutcome<T>) -> bool {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == ticket.generation);
        if !current {
            return false;
        }

        let Some(pending) = self.pending.take() else {
            return false;
        };

        match outcome {
            FetchOutcome::Completed(Ok(value)) => {
                self.state = FetchState::Loaded(value);
                true
            }
            FetchOutcome::Completed(Err(err)) => {
                tracing::warn!(error = %err, "fetch failed");
                self.state = FetchState::Failed(err.to_string());
                true
            }
            FetchOutcome::Cancelled => {
                self.state = pending.previous;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_catalog_envelope() {
        let products = parse_catalog(json!({
            "products": [{ "id": 1, "title": "Mug", "price": 4.5 }],
            "total": 1
        }))
        .unwrap();
        assert_eq!(products.len(), 1);

        assert!(parse_catalog(json!({ "total": 0 })).unwrap().is_empty());
        assert!(matches!(
            parse_catalog(json!("oops")),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_catalog(json!({ "products": [{ "title": "no id" }] })),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_catalog_tolerates_null_fields() {
        let products = parse_catalog(json!({
            "products": [
                { "id": 1, "title": "A", "price": 1.0 },
                { "id": 2, "title": "B", "price": 2.0, "description": null, "stock": null }
            ]
        }))
        .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[1].description, "");
        assert_eq!(products[1].stock, 0);
    }

    #[test]
    fn test_parse_product_without_id_is_not_found() {
        assert_eq!(
            parse_product(8, json!({ "message": "Product with id '8' not found" })),
            Err(FetchError::NotFound(8))
        );
        assert!(parse_product(8, json!({ "id": 8, "title": "Desk", "price": 80.0 })).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_completes_when_not_cancelled() {
        let token = CancellationToken::new();
        let outcome = fetch_with_cancel(&token, async { Ok::<_, FetchError>(5) }).await;
        assert_eq!(outcome, FetchOutcome::Completed(Ok(5)));
    }

    #[tokio::test]
    async fn test_fetch_cancelled_before_completion() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, FetchError>(1)
        };

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        assert_eq!(fetch_with_cancel(&token, slow).await, FetchOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_result_after_cancellation_is_discarded() {
        let token = CancellationToken::new();
        let inner = token.clone();
        let fetch = async move {
            inner.cancel();
            Ok::<_, FetchError>(1)
        };

        assert_eq!(fetch_with_cancel(&token, fetch).await, FetchOutcome::Cancelled);
    }

    #[test]
    fn test_slot_load_and_fail() {
        let mut slot: FetchSlot<u32> = FetchSlot::new();
        assert_eq!(slot.state(), &FetchState::Idle);

        let ticket = slot.begin();
        assert!(slot.state().is_loading());
        assert!(slot.finish(&ticket, FetchOutcome::Completed(Ok(3))));
        assert_eq!(slot.state().loaded(), Some(&3));

        let retry = slot.begin();
        assert!(slot.finish(
            &retry,
            FetchOutcome::Completed(Err(FetchError::Network("refused".into())))
        ));
        assert_eq!(slot.state().error(), Some("Network error: refused"));
        assert_eq!(slot.state().loaded(), None);
    }

    #[test]
    fn test_slot_cancel_restores_previous_state() {
        let mut slot: FetchSlot<u32> = FetchSlot::new();
        let first = slot.begin();
        slot.finish(&first, FetchOutcome::Completed(Ok(7)));

        let second = slot.begin();
        assert!(slot.cancel());
        assert!(second.token().is_cancelled());
        assert_eq!(slot.state(), &FetchState::Loaded(7));

        // A late result of the cancelled load changes nothing.
        assert!(!slot.finish(&second, FetchOutcome::Completed(Ok(99))));
        assert_eq!(slot.state(), &FetchState::Loaded(7));
        assert!(!slot.cancel());
    }

    #[test]
    fn test_slot_superseded_ticket_is_ignored() {
        let mut slot: FetchSlot<u32> = FetchSlot::new();
        let stale = slot.begin();
        let fresh = slot.begin();
        assert!(stale.token().is_cancelled());

        assert!(!slot.finish(&stale, FetchOutcome::Completed(Ok(1))));
        assert!(slot.state().is_loading());

        assert!(slot.finish(&fresh, FetchOutcome::Completed(Ok(2))));
        assert_eq!(slot.state(), &FetchState::Loaded(2));
    }

    #[test]
    fn test_slot_cancelled_outcome_restores_idle() {
        let mut slot: FetchSlot<u32> = FetchSlot::new();
        let ticket = slot.begin();
        assert!(!slot.finish(&ticket, FetchOutcome::Cancelled));
        assert_eq!(slot.state(), &FetchState::Idle);
    }
}
