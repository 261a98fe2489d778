//! Catalog query engine
//!
//! Derives the list of products to display from the full catalog, the local
//! filter criteria of the browsing view and the session's global search term.
//!
//! ## Pipeline
//! ```text
//! products ─► text_filter ─► category_filter ─► price_filter ─► sort_products ─► view
//!                 ▲
//!     effective_search(global, criteria.search)
//! ```
//!
//! Every filter stage keeps the relative order of its input and is a no-op
//! when its criterion is at the neutral value. Sorting is stable.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::models::{Catalog, CategoryOption, Product, ProductId};
use super::search::GlobalSearchTerm;

/// Upper end of the price slider; the default ceiling of [`QueryCriteria`].
pub const DEFAULT_MAX_PRICE: f64 = 10_000.0;

// =============================================================================
// Criteria
// =============================================================================

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Catalog order
    #[default]
    Default,
    #[serde(alias = "price-asc")]
    PriceLow,
    #[serde(alias = "price-desc")]
    PriceHigh,
    /// Highest rating first
    #[serde(alias = "rating-desc")]
    Rating,
    /// Title, lexicographic
    #[serde(alias = "title")]
    Name,
}

/// Local filter and sort inputs of the browsing view.
///
/// Missing fields deserialize to their neutral values, so an empty query
/// string yields the unfiltered catalog in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryCriteria {
    pub search: String,
    pub category: String,
    pub min_price: f64,
    pub max_price: f64,
    pub sort_by: SortKey,
}

impl Default for QueryCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: String::new(),
            min_price: 0.0,
            max_price: DEFAULT_MAX_PRICE,
            sort_by: SortKey::Default,
        }
    }
}

// =============================================================================
// Pipeline stages
// =============================================================================

/// Picks the search text the view filters on.
///
/// A global term that is non-empty after trimming wins (trimmed); otherwise
/// the local field is used verbatim.
pub fn effective_search<'a>(global: &'a GlobalSearchTerm, local: &'a str) -> &'a str {
    global.active().unwrap_or(local)
}

/// Keeps products whose title, description or category contains `text`,
/// ignoring case.
pub fn text_filter<'a>(products: Vec<&'a Product>, text: &str) -> Vec<&'a Product> {
    if text.is_empty() {
        return products;
    }

    let needle = text.to_lowercase();
    products
        .into_iter()
        .filter(|p| {
            p.title.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Keeps products whose category equals `category`, ignoring case.
pub fn category_filter<'a>(products: Vec<&'a Product>, category: &str) -> Vec<&'a Product> {
    if category.is_empty() {
        return products;
    }

    let wanted = category.to_lowercase();
    products
        .into_iter()
        .filter(|p| p.category.to_lowercase() == wanted)
        .collect()
}

/// Keeps products priced within `min..=max`.
pub fn price_filter<'a>(products: Vec<&'a Product>, min: f64, max: f64) -> Vec<&'a Product> {
    products
        .into_iter()
        .filter(|p| p.price >= min && p.price <= max)
        .collect()
}

/// Sorts in place; ties keep their relative order.
pub fn sort_products(products: &mut [&Product], key: SortKey) {
    match key {
        SortKey::Default => {}
        SortKey::PriceLow => products.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceHigh => products.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::Rating => products.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortKey::Name => products.sort_by(|a, b| compare_titles(&a.title, &b.title)),
    }
}

/// Alphabetical ordering of titles.
///
/// Compares base letters first, then accents, then case (lower case first),
/// so "Éclair" sorts among the e's. Only Latin-1 accents are folded; other
/// letters compare by code point.
fn compare_titles(a: &str, b: &str) -> Ordering {
    let lower = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    let (a_lower, b_lower) = (lower(a), lower(b));

    let a_base = a_lower.iter().map(|&c| base_letter(c));
    let b_base = b_lower.iter().map(|&c| base_letter(c));

    a_base
        .cmp(b_base)
        .then_with(|| a_lower.cmp(&b_lower))
        .then_with(|| b.cmp(a))
}

/// Strips the accent from a lower-case Latin-1 letter.
fn base_letter(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

// =============================================================================
// View
// =============================================================================

/// Runs the full pipeline over `products`.
pub fn view<'a>(
    products: &'a [Product],
    criteria: &QueryCriteria,
    global: &GlobalSearchTerm,
) -> Vec<&'a Product> {
    let search = effective_search(global, &criteria.search);

    let filtered = text_filter(products.iter().collect(), search);
    let filtered = category_filter(filtered, &criteria.category);
    let mut filtered = price_filter(filtered, criteria.min_price, criteria.max_price);

    sort_products(&mut filtered, criteria.sort_by);
    filtered
}

/// Distinct categories in order of first appearance, labelled for display.
pub fn categories(products: &[Product]) -> Vec<CategoryOption> {
    let mut options: Vec<CategoryOption> = Vec::new();

    for product in products {
        if options.iter().any(|o| o.value == product.category) {
            continue;
        }
        options.push(CategoryOption {
            value: product.category.clone(),
            label: capitalize(&product.category),
        });
    }

    options
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Cache
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct CacheKey {
    revision: u64,
    criteria: QueryCriteria,
    search: String,
}

/// Memoizes the last derived view of a catalog.
///
/// The key covers every input of [`view`], so any change of catalog revision,
/// criteria or effective search text recomputes.
#[derive(Debug, Default)]
pub struct QueryCache {
    key: Option<CacheKey>,
    ids: Vec<ProductId>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the derived view, recomputing only when an input changed.
    pub fn view<'a>(
        &mut self,
        catalog: &'a Catalog,
        criteria: &QueryCriteria,
        global: &GlobalSearchTerm,
    ) -> Vec<&'a Product> {
        let key = CacheKey {
            revision: catalog.revision(),
            criteria: criteria.clone(),
            search: effective_search(global, &criteria.search).to_string(),
        };

        if self.key.as_ref() == Some(&key) {
            return self.ids.iter().filter_map(|&id| catalog.get(id)).collect();
        }

        let products = view(catalog.products(), criteria, global);
        self.ids = products.iter().map(|p| p.id).collect();
        self.key = Some(key);
        products
    }

    /// Returns true when the next call with these inputs is served from cache.
    pub fn is_fresh(
        &self,
        catalog: &Catalog,
        criteria: &QueryCriteria,
        global: &GlobalSearchTerm,
    ) -> bool {
        self.key.as_ref().is_some_and(|key| {
            key.revision == catalog.revision()
                && key.criteria == *criteria
                && key.search == effective_search(global, &criteria.search)
        })
    }
}
