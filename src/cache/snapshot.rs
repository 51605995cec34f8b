use std::collections::BTreeMap;

use crate::domain::entities::{Category, Product, ProductType, TaxonomyRecord};

/// One consistent view of the three remote collections, built from a single fetch.
///
/// Never mutated after construction; the cache publishes a new `Arc` instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    categories: BTreeMap<String, Category>,
    product_types: BTreeMap<String, ProductType>,
    products: Vec<Product>,
    best_sellers: Vec<Product>,
}

impl CatalogSnapshot {
    /// Build from raw collection reads. `products` must already be ordered by name.
    ///
    /// Duplicate taxonomy keys keep the last document read.
    pub fn build(
        categories: Vec<TaxonomyRecord>,
        product_types: Vec<TaxonomyRecord>,
        products: Vec<Product>,
    ) -> Self {
        let categories = index_by_key(categories);
        let product_types = index_by_key(product_types);
        let best_sellers = products
            .iter()
            .filter(|product| product.is_best_seller)
            .cloned()
            .collect();

        Self {
            categories,
            product_types,
            products,
            best_sellers,
        }
    }

    pub fn categories(&self) -> &BTreeMap<String, Category> {
        &self.categories
    }

    pub fn product_types(&self) -> &BTreeMap<String, ProductType> {
        &self.product_types
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn best_sellers(&self) -> &[Product] {
        &self.best_sellers
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Display label for a category key; `None` for keys missing from the mapping.
    pub fn category_label(&self, key: &str) -> Option<&str> {
        self.categories.get(key).map(|entry| entry.value.as_str())
    }

    pub fn product_type_label(&self, key: &str) -> Option<&str> {
        self.product_types.get(key).map(|entry| entry.value.as_str())
    }
}

fn index_by_key(records: Vec<TaxonomyRecord>) -> BTreeMap<String, Category> {
    records
        .into_iter()
        .map(|record| (record.key.clone(), record.entry()))
        .collect()
}
