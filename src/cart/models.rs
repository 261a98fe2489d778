//! Shopping Cart Domain Models
//!
//! This module contains all data structures related to the shopping cart
//! business domain.

use serde::{Deserialize, Serialize};

use crate::catalog::models::{Product, ProductId};

// =============================================================================
// Cart Domain Models
// =============================================================================

/// Represents one product's entry in the shopping cart
///
/// The display fields are a snapshot taken when the product was first added;
/// totals are always computed from `price`, never from a live catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Identifier of the product this line refers to
    pub id: ProductId,

    /// Quantity of this item, at least 1
    pub quantity: u32,

    pub title: String,

    /// Unit price at the time of adding
    pub price: f64,

    pub thumbnail: String,

    pub category: String,

    pub rating: f64,

    #[serde(default)]
    pub discount_percentage: Option<f64>,
}

impl CartLineItem {
    /// Creates a line item with quantity 1 from a product.
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            quantity: 1,
            title: product.title.clone(),
            price: product.price,
            thumbnail: product.thumbnail.clone(),
            category: product.category.clone(),
            rating: product.rating,
            discount_percentage: product.discount_percentage,
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Read model of a cart: its items plus the derived aggregates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartLineItem>,
    pub total_items: u64,
    pub total_price: f64,
}

// =============================================================================
// Request / Response Models
// =============================================================================

/// Input for adding a product to the cart
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemInput {
    pub product_id: ProductId,
}

/// Input for replacing a line item's quantity
///
/// Signed so that out-of-range values reach the store's guard instead of
/// being rejected by the JSON extractor.
#[derive(Debug, Deserialize)]
pub struct SetQuantityInput {
    pub quantity: i64,
}

/// Response for checkout
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Status of the operation
    pub status: String,

    /// What was ordered; the cart itself is now empty
    #[serde(flatten)]
    pub order: CartSnapshot,
}
