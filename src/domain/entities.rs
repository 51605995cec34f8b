//! Domain entities mirrored from the remote document collections.

use serde::Serialize;
use time::OffsetDateTime;

/// Key/label pair shared by categories and product types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyEntry {
    pub key: String,
    pub value: String,
}

pub type Category = TaxonomyEntry;
pub type ProductType = TaxonomyEntry;

/// A taxonomy document as stored, including its opaque document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyRecord {
    pub id: String,
    pub key: String,
    pub value: String,
}

impl TaxonomyRecord {
    pub fn entry(&self) -> TaxonomyEntry {
        TaxonomyEntry {
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Whole currency units.
    pub price: u64,
    /// Key into the category mapping; may dangle.
    pub category: String,
    /// Key into the product type mapping; may dangle.
    pub product_type: String,
    pub description: String,
    /// Hosted image URL, empty when the product has no picture.
    pub image: String,
    pub is_best_seller: bool,
    pub rating: f64,
    pub sold: u64,
    pub shopee_link: String,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl Product {
    pub fn has_image(&self) -> bool {
        !self.image.trim().is_empty()
    }
}
