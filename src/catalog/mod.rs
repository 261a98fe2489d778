//! Product Catalog Module
//!
//! This module contains everything about browsing the product catalog:
//! - Domain models (Product, Catalog, category options, responses)
//! - The query engine deriving filtered and sorted listings
//! - The session-wide search term
//! - Remote catalog access with cancellation
//! - REST API handlers

pub mod handlers;
pub mod models;
pub mod query;
pub mod search;
pub mod source;

// Re-export commonly used types for convenience
pub use handlers::routes;
pub use models::{Catalog, Product, ProductId};
pub use query::{view, QueryCriteria, SortKey};
pub use search::GlobalSearchTerm;
pub use source::{CatalogSource, DummyJsonSource};
