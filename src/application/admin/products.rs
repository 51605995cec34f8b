use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::images::ImageService;
use crate::application::repos::{
    CatalogSource, CatalogWriteRepo, CreateProductParams, ProductQuery, RepoError,
    UpdateProductParams,
};
use crate::application::session::SessionToken;
use crate::domain::entities::Product;
use crate::domain::error::DomainError;
use crate::domain::products::ProductInput;
use crate::domain::types::ProductFilter;

#[derive(Debug, Error)]
pub enum AdminProductError {
    #[error("product not found")]
    NotFound,
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct AdminProductService {
    reader: Arc<dyn CatalogSource>,
    writer: Arc<dyn CatalogWriteRepo>,
    images: ImageService,
}

impl AdminProductService {
    pub fn new(
        reader: Arc<dyn CatalogSource>,
        writer: Arc<dyn CatalogWriteRepo>,
        images: ImageService,
    ) -> Self {
        Self {
            reader,
            writer,
            images,
        }
    }

    /// Fresh read from the store; the storefront cache is not consulted.
    pub async fn list(
        &self,
        filter: Option<ProductFilter>,
    ) -> Result<Vec<Product>, AdminProductError> {
        let query = match filter {
            Some(filter) => ProductQuery::filtered(filter),
            None => ProductQuery::ordered_by_name(),
        };
        self.reader
            .list_products(&query)
            .await
            .map_err(AdminProductError::from)
    }

    pub async fn find(&self, id: &str) -> Result<Product, AdminProductError> {
        self.reader
            .find_product(id)
            .await?
            .ok_or(AdminProductError::NotFound)
    }

    pub async fn create(
        &self,
        token: &SessionToken,
        input: ProductInput,
    ) -> Result<String, AdminProductError> {
        let fields = input.validate()?;
        let id = self
            .writer
            .create_product(
                token,
                CreateProductParams {
                    fields,
                    created_at: OffsetDateTime::now_utc(),
                    created_by: token.email_claim(),
                },
            )
            .await?;

        info!(target = "butik::admin::products", product_id = %id, "product created");
        Ok(id)
    }

    /// Overwrite the editable fields of a product.
    ///
    /// When the picture changes, the previous hosted image is removed after the
    /// write succeeds; a failed removal is logged and does not fail the update.
    pub async fn update(
        &self,
        token: &SessionToken,
        id: &str,
        input: ProductInput,
    ) -> Result<Product, AdminProductError> {
        let fields = input.validate()?;
        let previous = self.find(id).await?;
        let updated_at = OffsetDateTime::now_utc();
        let updated_by = token.email_claim();

        self.writer
            .update_product(
                token,
                UpdateProductParams {
                    id: id.to_string(),
                    fields: fields.clone(),
                    updated_at,
                    updated_by: updated_by.clone(),
                },
            )
            .await?;

        if previous.has_image() && previous.image != fields.image {
            self.images.discard_url(&previous.image).await;
        }

        info!(target = "butik::admin::products", product_id = %id, "product updated");
        Ok(Product {
            name: fields.name,
            price: fields.price,
            category: fields.category,
            product_type: fields.product_type,
            description: fields.description,
            image: fields.image,
            shopee_link: fields.shopee_link,
            is_best_seller: fields.is_best_seller,
            updated_at: Some(updated_at),
            updated_by,
            ..previous
        })
    }

    pub async fn delete(&self, token: &SessionToken, id: &str) -> Result<(), AdminProductError> {
        let existing = self.find(id).await?;
        self.writer.delete_product(token, id).await?;

        if existing.has_image() {
            self.images.discard_url(&existing.image).await;
        }

        info!(target = "butik::admin::products", product_id = %id, "product deleted");
        Ok(())
    }
}
