//! Shopping Cart Formatting Helpers

use super::models::CartLineItem;

/// Produces a human-readable one-line summary for a list of cart items.
///
/// Example output: `"2x Red Shirt, 1x Blue Shoes"`.
pub fn format_item_summary(items: &[CartLineItem]) -> String {
    items
        .iter()
        .map(|i| format!("{}x {}", i.quantity, i.title))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats an amount with two decimals, e.g. `"$19.98"`.
pub fn format_price(amount: f64) -> String {
    format!("${:.2}", amount)
}
