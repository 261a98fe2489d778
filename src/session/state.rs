//! Session State Management
//!
//! Every browsing session owns its cart, its global search term and its copy
//! of the catalog. Sessions live in a `DashMap`, so each mutation runs under
//! that session's entry lock and is seen atomically by later requests. Locks
//! are never held across a remote fetch.

use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::cart::store::CartStore;
use crate::catalog::{
    models::{Catalog, Product, ProductId},
    query::QueryCache,
    search::GlobalSearchTerm,
    source::{fetch_with_cancel, CatalogSource, DummyJsonSource, FetchSlot, FetchState},
};
use crate::config::AppConfig;
use crate::error::{ApiError, FetchError};

// =============================================================================
// Session
// =============================================================================

/// State of one browsing session
#[derive(Debug, Default)]
pub struct Session {
    pub cart: CartStore,
    pub search: GlobalSearchTerm,
    pub catalog: FetchSlot<Arc<Catalog>>,
    pub query_cache: QueryCache,
}

impl Session {
    /// Returns the loaded catalog, or why there is none.
    pub fn loaded_catalog(&self) -> Result<&Arc<Catalog>, ApiError> {
        match self.catalog.state() {
            FetchState::Loaded(catalog) => Ok(catalog),
            FetchState::Loading => Err(ApiError::CatalogLoading),
            FetchState::Failed(message) => Err(ApiError::CatalogUnavailable(message.clone())),
            FetchState::Idle => Err(ApiError::CatalogNotLoaded),
        }
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Core application state containing sessions and the catalog collaborator
pub struct AppState {
    /// In-memory sessions, keyed by session id.
    pub sessions: DashMap<String, Session>,

    /// Where product data comes from.
    pub source: Arc<dyn CatalogSource>,

    revisions: AtomicU64,
}

impl AppState {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            sessions: DashMap::new(),
            source,
            revisions: AtomicU64::new(0),
        }
    }

    /// Creates state backed by the remote catalog named in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let source = DummyJsonSource::new(&config.catalog_base_url, config.catalog_timeout)?;
        Ok(Self::new(Arc::new(source)))
    }

    /// Runs `f` on the session `id`, creating the session on first use.
    ///
    /// Only for writes; reads go through `read_session`.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.sessions.entry(id.to_string()).or_default();
        f(&mut session)
    }

    /// Runs `f` on the session `id` if it exists, without creating it.
    pub fn update_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.get_mut(id).map(|mut session| f(&mut session))
    }

    /// Reads the session `id`. An unknown session reads as a fresh one and is
    /// not stored.
    pub fn read_session<R>(&self, id: &str, f: impl FnOnce(&Session) -> R) -> R {
        match self.sessions.get(id) {
            Some(session) => f(&session),
            None => f(&Session::default()),
        }
    }

    /// Drops a session and cancels its catalog fetch, if one is running.
    pub fn end_session(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, mut session)) => {
                session.catalog.cancel();
                true
            }
            None => false,
        }
    }

    fn next_revision(&self) -> u64 {
        self.revisions.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Fetches the catalog for `session_id` from scratch.
    ///
    /// Returns the resulting state label. A fetch that gets cancelled or
    /// superseded while in flight leaves the session untouched.
    pub async fn load_catalog(&self, session_id: &str) -> &'static str {
        let ticket = self.with_session(session_id, |s| s.catalog.begin());
        tracing::info!(session_id, "loading catalog");

        let outcome = fetch_with_cancel(ticket.token(), self.source.fetch_catalog()).await;
        let revision = self.next_revision();
        let outcome = outcome.map(|products| Arc::new(Catalog::new(revision, products)));

        self.update_session(session_id, |s| {
            s.catalog.finish(&ticket, outcome);
            s.catalog.state().label()
        })
        .unwrap_or("idle")
    }

    /// Loads the catalog unless the session already has one or is fetching.
    pub async fn ensure_catalog(&self, session_id: &str) {
        let idle = self.read_session(session_id, |s| {
            matches!(s.catalog.state(), FetchState::Idle)
        });
        if idle {
            self.load_catalog(session_id).await;
        }
    }

    /// Cancels the catalog fetch running for `session_id`.
    pub fn cancel_catalog_load(&self, session_id: &str) -> bool {
        self.update_session(session_id, |s| s.catalog.cancel())
            .unwrap_or(false)
    }

    /// Resolves a product, preferring the session's loaded catalog.
    pub async fn find_product(&self, session_id: &str, id: ProductId) -> Result<Product, ApiError> {
        let cached = self.read_session(session_id, |s| {
            s.catalog
                .state()
                .loaded()
                .and_then(|catalog| catalog.get(id).cloned())
        });

        match cached {
            Some(product) => Ok(product),
            None => match self.source.fetch_product(id).await {
                Ok(product) => Ok(product),
                Err(FetchError::NotFound(id)) => Err(ApiError::UnknownProduct(id)),
                Err(err) => Err(err.into()),
            },
        }
    }
}
