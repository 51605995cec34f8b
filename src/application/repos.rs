//! Repository traits describing the remote document store adapter.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::session::SessionToken;
use crate::domain::entities::{Product, TaxonomyRecord};
use crate::domain::products::ProductFields;
use crate::domain::types::{ProductFilter, TaxonomyKind};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("remote store request failed: {0}")]
    Transport(String),
    #[error("remote store rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("permission denied by remote store: {message}")]
    PermissionDenied { message: String },
    #[error("resource not found")]
    NotFound,
    #[error("malformed document `{document}`: {message}")]
    Malformed { document: String, message: String },
    #[error("remote store timeout")]
    Timeout,
}

impl RepoError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn malformed(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            document: document.into(),
            message: message.into(),
        }
    }
}

/// Shape of a product read: optional equality filter and optional name ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub filter: Option<ProductFilter>,
    pub order_by_name: bool,
}

impl ProductQuery {
    /// Every product, ascending by name; the catalog cache's only product read.
    pub fn ordered_by_name() -> Self {
        Self {
            filter: None,
            order_by_name: true,
        }
    }

    pub fn filtered(filter: ProductFilter) -> Self {
        Self {
            filter: Some(filter),
            order_by_name: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub fields: ProductFields,
    pub created_at: OffsetDateTime,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateProductParams {
    pub id: String,
    pub fields: ProductFields,
    pub updated_at: OffsetDateTime,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTaxonomyParams {
    pub kind: TaxonomyKind,
    pub key: String,
    pub value: String,
}

/// Read side of the document store, consumed by the catalog cache and admin listings.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyRecord>, RepoError>;

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, RepoError>;

    async fn find_product(&self, id: &str) -> Result<Option<Product>, RepoError>;
}

/// Write side of the document store. Every call is made on behalf of a signed-in admin.
#[async_trait]
pub trait CatalogWriteRepo: Send + Sync {
    async fn create_product(
        &self,
        token: &SessionToken,
        params: CreateProductParams,
    ) -> Result<String, RepoError>;

    async fn update_product(
        &self,
        token: &SessionToken,
        params: UpdateProductParams,
    ) -> Result<(), RepoError>;

    async fn delete_product(&self, token: &SessionToken, id: &str) -> Result<(), RepoError>;

    async fn create_taxonomy(
        &self,
        token: &SessionToken,
        params: CreateTaxonomyParams,
    ) -> Result<String, RepoError>;

    async fn delete_taxonomy(
        &self,
        token: &SessionToken,
        kind: TaxonomyKind,
        id: &str,
    ) -> Result<(), RepoError>;
}
