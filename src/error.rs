//! Error types
//!
//! The cart store and the query engine never fail; errors only exist at the
//! edges of the crate:
//!
//! - `FetchError`  - the remote catalog could not be read
//! - `ConfigError` - the environment holds an unusable value
//! - `ApiError`    - what an HTTP client sees

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::models::ProductId;

// =============================================================================
// Fetch Error
// =============================================================================

/// Failure of the remote catalog collaborator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Connection refused, DNS failure, TLS error, ...
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("HTTP error! status: {status} - {reason}")]
    Status { status: u16, reason: String },

    /// The body was not the expected JSON shape.
    #[error("Invalid response format from server: {0}")]
    Malformed(String),

    #[error("Product not found")]
    NotFound(ProductId),

    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

// =============================================================================
// API Error
// =============================================================================

/// Errors returned by the REST handlers.
///
/// Rendered as `{ "error": { "code": ..., "message": ... } }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Catalog is still loading")]
    CatalogLoading,

    #[error("Catalog has not been loaded")]
    CatalogNotLoaded,

    /// The last catalog load failed; carries its message.
    #[error("{0}")]
    CatalogUnavailable(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Fetch(FetchError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Fetch(FetchError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ApiError::CatalogLoading | ApiError::CatalogNotLoaded => StatusCode::CONFLICT,
            ApiError::CatalogUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::UnknownProduct(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Fetch(FetchError::NotFound(_)) => "product_not_found",
            ApiError::Fetch(_) => "fetch_failed",
            ApiError::CatalogLoading => "catalog_loading",
            ApiError::CatalogNotLoaded => "catalog_not_loaded",
            ApiError::CatalogUnavailable(_) => "catalog_unavailable",
            ApiError::UnknownProduct(_) => "unknown_product",
            ApiError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Convenience alias for handler results
pub type ApiResult<T> = Result<T, ApiError>;
