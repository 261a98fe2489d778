//! Cart Store
//!
//! Owns the ordered list of line items of one session and every way of
//! changing it. Invalid requests (unknown product, quantity below 1) leave the
//! cart untouched instead of failing; the callers only offer actions that are
//! already valid.
//!
//! Totals are computed on every read so they can never drift from the items.

use tracing::debug;

use super::models::{CartLineItem, CartSnapshot};
use crate::catalog::models::{Product, ProductId};

/// Line items in insertion order, at most one per product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartStore {
    items: Vec<CartLineItem>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    pub fn get(&self, id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn get_mut(&mut self, id: ProductId) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Adds one unit of `product`.
    ///
    /// A product already in the cart gets its quantity bumped; otherwise a new
    /// line item is appended with a snapshot of the product.
    pub fn add_item(&mut self, product: &Product) {
        if let Some(existing) = self.get_mut(product.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            debug!(product_id = product.id, quantity = existing.quantity, "cart item incremented");
        } else {
            self.items.push(CartLineItem::from_product(product));
            debug!(product_id = product.id, "cart item added");
        }
    }

    /// Deletes the line item for `id`, if any.
    pub fn remove_item(&mut self, id: ProductId) {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() != before {
            debug!(product_id = id, "cart item removed");
        }
    }

    /// Replaces the quantity of an existing line item.
    ///
    /// Quantities below 1 are ignored; removal is the only way out of the cart.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) {
        let Ok(quantity) = u32::try_from(quantity) else {
            return;
        };
        if quantity < 1 {
            return;
        }

        if let Some(item) = self.get_mut(id) {
            item.quantity = quantity;
            debug!(product_id = id, quantity, "cart quantity set");
        }
    }

    pub fn increment_quantity(&mut self, id: ProductId) {
        if let Some(item) = self.get(id) {
            let next = i64::from(item.quantity) + 1;
            self.set_quantity(id, next);
        }
    }

    /// Lowers the quantity by one, stopping at 1.
    pub fn decrement_quantity(&mut self, id: ProductId) {
        if let Some(item) = self.get(id) {
            let next = i64::from(item.quantity) - 1;
            self.set_quantity(id, next);
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all quantities.
    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of unit price × quantity over all line items, unrounded.
    pub fn total_price(&self) -> f64 {
        self.items
            .iter()
            .fold(0.0, |total, item| total + item.line_total())
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total_items: self.total_item_count(),
            total_price: self.total_price(),
        }
    }
}
