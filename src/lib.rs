//! Shop State Library
//!
//! This library provides the commerce state of a catalog-browsing storefront:
//! a per-session shopping cart and a query engine that derives filtered,
//! sorted product listings from a remotely fetched catalog.

// Domain modules
pub mod cart;
pub mod catalog;
pub mod session;

// Infrastructure
pub mod config;
pub mod error;
pub mod router;
