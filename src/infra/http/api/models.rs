//! JSON shapes exchanged by the storefront API and the admin endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::domain::entities::{Product, TaxonomyEntry, TaxonomyRecord};
use crate::domain::products::{PriceInput, ProductInput};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: u64,
    pub category: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub description: String,
    pub image: String,
    pub is_best_seller: bool,
    pub rating: f64,
    pub sold: u64,
    pub shopee_link: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            category: product.category,
            product_type: product.product_type,
            description: product.description,
            image: product.image,
            is_best_seller: product.is_best_seller,
            rating: product.rating,
            sold: product.sold,
            shopee_link: product.shopee_link,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductView>,
    pub total: usize,
}

impl ProductListResponse {
    pub fn new(products: Vec<Product>) -> Self {
        let products: Vec<ProductView> = products.into_iter().map(ProductView::from).collect();
        Self {
            total: products.len(),
            products,
        }
    }
}

/// Taxonomy keyed by its `key`, as the storefront filters expect it.
#[derive(Debug, Serialize)]
pub struct TaxonomyMapResponse {
    pub entries: BTreeMap<String, TaxonomyEntry>,
}

#[derive(Debug, Serialize)]
pub struct TaxonomyListResponse {
    pub entries: Vec<TaxonomyRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProductsQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub best_seller: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(default)]
    pub name: String,
    pub price: PriceInput,
    #[serde(default)]
    pub category: String,
    #[serde(default, rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub shopee_link: String,
    #[serde(default)]
    pub is_best_seller: bool,
}

impl From<ProductPayload> for ProductInput {
    fn from(payload: ProductPayload) -> Self {
        Self {
            name: payload.name,
            price: payload.price,
            category: payload.category,
            product_type: payload.product_type,
            description: payload.description,
            image: payload.image,
            shopee_link: payload.shopee_link,
            is_best_seller: payload.is_best_seller,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct TaxonomyPayload {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDeleteRequest {
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageDeleteResponse {
    pub success: bool,
    pub message: String,
    pub details: Value,
}
