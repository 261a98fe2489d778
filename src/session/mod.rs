//! Browsing Session Module
//!
//! This module ties the cart and catalog state of one visitor together:
//! - Session storage and the catalog load lifecycle
//! - Cookie-based session resolution
//! - REST API handlers for ending a session

pub mod handlers;
pub mod helpers;
pub mod state;

pub use handlers::routes;
pub use helpers::{resolve_session_id, with_session_cookie};
pub use state::{AppState, Session, SharedState};
