//! Derived views over a product sequence.
//!
//! Every function here is pure: no I/O, no hidden state, and the output keeps
//! the relative order of the input.

use crate::domain::entities::Product;

pub fn filter_by_category<'a>(products: &'a [Product], key: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|product| product.category == key)
        .collect()
}

pub fn filter_by_type<'a>(products: &'a [Product], key: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|product| product.product_type == key)
        .collect()
}

pub fn filter_best_sellers(products: &[Product]) -> Vec<&Product> {
    products
        .iter()
        .filter(|product| product.is_best_seller)
        .collect()
}

/// Case-insensitive substring match on name or description.
///
/// The empty query is a substring of everything, so it matches every product.
pub fn search<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.to_lowercase();
    products
        .iter()
        .filter(|product| matches_search(product, &needle))
        .collect()
}

/// `needle` must already be lowercased.
fn matches_search(product: &Product, needle: &str) -> bool {
    needle.is_empty()
        || product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
}

/// Storefront browse criteria: category, then type, then free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseFilter {
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub query: String,
}

impl BrowseFilter {
    /// `needle` is the lowercased query.
    fn matches_lowered(&self, product: &Product, needle: &str) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|key| product.category == key);
        let type_ok = self
            .product_type
            .as_deref()
            .is_none_or(|key| product.product_type == key);
        category_ok && type_ok && matches_search(product, needle)
    }
}

pub fn browse<'a>(products: &'a [Product], filter: &BrowseFilter) -> Vec<&'a Product> {
    let needle = filter.query.to_lowercase();
    products
        .iter()
        .filter(|product| filter.matches_lowered(product, &needle))
        .collect()
}
