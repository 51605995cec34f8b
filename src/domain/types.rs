//! Shared domain enumerations aligned with the remote collections.

use serde::{Deserialize, Serialize};

/// Key/label collections that products reference by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Category,
    ProductType,
}

impl TaxonomyKind {
    /// Name of the backing collection in the document store.
    pub fn collection(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::ProductType => "productTypes",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::ProductType => "product_type",
        }
    }
}

/// Equality filters the product collection supports server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductFilter {
    Category(String),
    ProductType(String),
    BestSeller(bool),
}

impl ProductFilter {
    /// Document field the filter compares against.
    pub fn field_path(&self) -> &'static str {
        match self {
            ProductFilter::Category(_) => "category",
            ProductFilter::ProductType(_) => "type",
            ProductFilter::BestSeller(_) => "isBestSeller",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_kinds_map_to_remote_collections() {
        assert_eq!(TaxonomyKind::Category.collection(), "categories");
        assert_eq!(TaxonomyKind::ProductType.collection(), "productTypes");
    }

    #[test]
    fn product_filters_target_document_fields() {
        assert_eq!(
            ProductFilter::ProductType("gamis".into()).field_path(),
            "type"
        );
        assert_eq!(ProductFilter::BestSeller(true).field_path(), "isBestSeller");
    }
}
