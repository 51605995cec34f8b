use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{
    CatalogSource, CatalogWriteRepo, CreateTaxonomyParams, RepoError,
};
use crate::application::session::SessionToken;
use crate::domain::entities::TaxonomyRecord;
use crate::domain::error::DomainError;
use crate::domain::products::validate_taxonomy;
use crate::domain::types::TaxonomyKind;

#[derive(Debug, Error)]
pub enum AdminTaxonomyError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Categories and product types share one service; `kind` picks the collection.
#[derive(Clone)]
pub struct AdminTaxonomyService {
    reader: Arc<dyn CatalogSource>,
    writer: Arc<dyn CatalogWriteRepo>,
}

impl AdminTaxonomyService {
    pub fn new(reader: Arc<dyn CatalogSource>, writer: Arc<dyn CatalogWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list(
        &self,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyRecord>, AdminTaxonomyError> {
        let mut records = self.reader.list_taxonomy(kind).await?;
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    pub async fn add(
        &self,
        token: &SessionToken,
        kind: TaxonomyKind,
        key: &str,
        value: &str,
    ) -> Result<TaxonomyRecord, AdminTaxonomyError> {
        let (key, value) = validate_taxonomy(key, value)?;
        let id = self
            .writer
            .create_taxonomy(
                token,
                CreateTaxonomyParams {
                    kind,
                    key: key.clone(),
                    value: value.clone(),
                },
            )
            .await?;

        info!(
            target = "butik::admin::taxonomy",
            kind = kind.as_str(),
            id = %id,
            key = %key,
            "taxonomy entry added"
        );
        Ok(TaxonomyRecord { id, key, value })
    }

    /// Delete by document id. Products that reference the key are left as they are.
    pub async fn delete(
        &self,
        token: &SessionToken,
        kind: TaxonomyKind,
        id: &str,
    ) -> Result<(), AdminTaxonomyError> {
        self.writer.delete_taxonomy(token, kind, id).await?;
        info!(
            target = "butik::admin::taxonomy",
            kind = kind.as_str(),
            id,
            "taxonomy entry deleted"
        );
        Ok(())
    }
}
