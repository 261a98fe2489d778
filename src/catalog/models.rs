//! Catalog Domain Models
//!
//! This module contains the product record as it arrives from the remote
//! catalog service, plus the small derived types the query engine hands
//! back to callers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

// =============================================================================
// Product
// =============================================================================

/// Stable identifier of a product in the remote catalog.
pub type ProductId = u64;

/// A product record, immutable once fetched.
///
/// Only `id`, `title` and `price` are required on the wire. Every other field
/// falls back to a defined default here, whether it is missing or `null`, so
/// the rest of the crate never has to null-check product data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique, stable identifier
    pub id: ProductId,

    /// Display title
    pub title: String,

    /// Free-form description (empty when absent)
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Category label, e.g. `"smartphones"` (empty when absent)
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,

    /// Unit price, non-negative
    pub price: f64,

    /// Discount percentage in `0..=100`; `None` means no discount
    #[serde(default)]
    pub discount_percentage: Option<f64>,

    /// Average rating in `0.0..=5.0`
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,

    /// Units in stock; absent is treated as 0
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: u32,

    /// Brand label, when the catalog provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Thumbnail image URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail: String,

    /// Full-size image URLs
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
}

/// Reads `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Catalog
// =============================================================================

/// The full, unfiltered product set of one browsing session.
///
/// Each successful load gets a fresh `revision`, which is what derived views
/// key their caches on. Products keep the order the remote service sent them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    revision: u64,
    products: Vec<Product>,
    positions: HashMap<ProductId, usize>,
}

impl Catalog {
    pub fn new(revision: u64, products: Vec<Product>) -> Self {
        let mut positions = HashMap::with_capacity(products.len());
        for (idx, product) in products.iter().enumerate() {
            positions.entry(product.id).or_insert(idx);
        }

        Self {
            revision,
            products,
            positions,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Looks up a product by identifier.
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.positions.get(&id).map(|&idx| &self.products[idx])
    }
}

/// One entry of the category selector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryOption {
    /// Raw category string, used as the filter value
    pub value: String,

    /// Category with its first character upper-cased
    pub label: String,
}

// =============================================================================
// Request / Response Models
// =============================================================================

/// Response for product listings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    /// Number of products after filtering
    pub count: usize,

    /// Search text the listing was filtered on
    pub search: String,

    pub products: Vec<Product>,
}

/// Response describing the catalog load state of a session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatusResponse {
    /// One of `idle`, `loading`, `loaded`, `failed`
    pub status: String,

    /// Number of products when loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Failure message when the last load failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Input for setting the global search term
#[derive(Debug, Deserialize)]
pub struct SearchTermInput {
    #[serde(default)]
    pub term: String,
}

/// Response carrying the global search term
#[derive(Debug, Serialize)]
pub struct SearchTermResponse {
    pub term: String,

    /// Whether the term currently overrides the listing's own search field
    pub active: bool,
}
