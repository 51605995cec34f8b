use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::application::repos::{
    CatalogSource, CatalogWriteRepo, CreateProductParams, CreateTaxonomyParams, ProductQuery,
    RepoError, UpdateProductParams,
};
use crate::application::session::SessionToken;
use crate::config::{FirestoreSettings, Secret};
use crate::domain::entities::{Product, TaxonomyRecord};
use crate::domain::types::{ProductFilter, TaxonomyKind};

use super::codec::{
    PRODUCT_UPDATE_MASK, create_product_fields, product_from_document, taxonomy_from_document,
    taxonomy_to_fields, update_product_fields,
};
use super::value::{
    Document, DocumentFields, ListDocumentsResponse, RemoteErrorBody, RunQueryItem, Value,
};

const PRODUCTS: &str = "products";

/// REST adapter for the hosted document store.
///
/// Reads are anonymous (optionally keyed); writes carry the admin's identity token.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    documents_url: String,
    api_key: Option<Secret>,
    page_size: u32,
}

impl FirestoreClient {
    pub fn new(http: Client, settings: &FirestoreSettings) -> Self {
        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            settings.base_url.as_str().trim_end_matches('/'),
            settings.project_id,
            settings.database,
        );
        Self {
            http,
            documents_url,
            api_key: settings.api_key.clone(),
            page_size: settings.page_size.get(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.documents_url)
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<String, RepoError> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') || id == "." || id == ".." {
            return Err(RepoError::NotFound);
        }
        Ok(format!("{}/{collection}/{id}", self.documents_url))
    }

    fn keyed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.expose())]),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: RequestBuilder,
    ) -> Result<T, RepoError> {
        let started = Instant::now();
        let response = self.keyed(request).send().await.map_err(map_transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport)?;
        debug!(
            target = "butik::firestore",
            op,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "document store call finished"
        );

        if !status.is_success() {
            return Err(map_status(status, &body));
        }
        serde_json::from_slice(&body)
            .map_err(|err| RepoError::transport(format!("{op}: undecodable response: {err}")))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, RepoError> {
        let page_size = self.page_size.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", page_size.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let request = self.http.get(self.collection_url(collection)).query(&query);
            let page: ListDocumentsResponse = self.send("list_documents", request).await?;
            documents.extend(page.documents);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn run_query(&self, query: &ProductQuery) -> Result<Vec<Document>, RepoError> {
        let mut structured = json!({ "from": [{ "collectionId": PRODUCTS }] });
        if let Some(filter) = &query.filter {
            structured["where"] = json!({
                "fieldFilter": {
                    "field": { "fieldPath": filter.field_path() },
                    "op": "EQUAL",
                    "value": filter_value(filter),
                }
            });
        }
        if query.order_by_name {
            structured["orderBy"] = json!([
                { "field": { "fieldPath": "name" }, "direction": "ASCENDING" }
            ]);
        }

        let request = self
            .http
            .post(format!("{}:runQuery", self.documents_url))
            .json(&json!({ "structuredQuery": structured }));
        let items: Vec<RunQueryItem> = self.send("run_query", request).await?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }
}

fn filter_value(filter: &ProductFilter) -> Value {
    match filter {
        ProductFilter::Category(key) | ProductFilter::ProductType(key) => Value::string(key),
        ProductFilter::BestSeller(flag) => Value::Boolean(*flag),
    }
}

fn map_transport(err: reqwest::Error) -> RepoError {
    if err.is_timeout() {
        RepoError::Timeout
    } else {
        RepoError::transport(err)
    }
}

fn map_status(status: StatusCode, body: &[u8]) -> RepoError {
    let message = serde_json::from_slice::<RemoteErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .map(|error| {
            if error.status.is_empty() {
                error.message
            } else {
                format!("{}: {}", error.status, error.message)
            }
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepoError::PermissionDenied { message },
        StatusCode::NOT_FOUND => RepoError::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RepoError::Timeout,
        _ => RepoError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

fn bearer(token: &SessionToken) -> String {
    format!("Bearer {}", token.as_str())
}

#[async_trait]
impl CatalogSource for FirestoreClient {
    async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyRecord>, RepoError> {
        self.list_documents(kind.collection())
            .await?
            .iter()
            .map(taxonomy_from_document)
            .collect()
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, RepoError> {
        let documents = if query.filter.is_none() && !query.order_by_name {
            self.list_documents(PRODUCTS).await?
        } else {
            self.run_query(query).await?
        };
        documents.iter().map(product_from_document).collect()
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>, RepoError> {
        let url = match self.document_url(PRODUCTS, id) {
            Ok(url) => url,
            Err(RepoError::NotFound) => return Ok(None),
            Err(err) => return Err(err),
        };
        match self.send::<Document>("get_document", self.http.get(url)).await {
            Ok(document) => product_from_document(&document).map(Some),
            Err(RepoError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl CatalogWriteRepo for FirestoreClient {
    async fn create_product(
        &self,
        token: &SessionToken,
        params: CreateProductParams,
    ) -> Result<String, RepoError> {
        let body = DocumentFields {
            fields: create_product_fields(params),
        };
        let request = self
            .http
            .post(self.collection_url(PRODUCTS))
            .header(reqwest::header::AUTHORIZATION, bearer(token))
            .json(&body);
        let created: Document = self.send("create_product", request).await?;
        Ok(created.id().to_string())
    }

    async fn update_product(
        &self,
        token: &SessionToken,
        params: UpdateProductParams,
    ) -> Result<(), RepoError> {
        let url = self.document_url(PRODUCTS, &params.id)?;
        let mut query: Vec<(&str, &str)> = PRODUCT_UPDATE_MASK
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let body = DocumentFields {
            fields: update_product_fields(params),
        };
        let request = self
            .http
            .patch(url)
            .query(&query)
            .header(reqwest::header::AUTHORIZATION, bearer(token))
            .json(&body);
        let _: Document = self.send("update_product", request).await?;
        Ok(())
    }

    async fn delete_product(&self, token: &SessionToken, id: &str) -> Result<(), RepoError> {
        let request = self
            .http
            .delete(self.document_url(PRODUCTS, id)?)
            .query(&[("currentDocument.exists", "true")])
            .header(reqwest::header::AUTHORIZATION, bearer(token));
        let _: serde_json::Value = self.send("delete_product", request).await?;
        Ok(())
    }

    async fn create_taxonomy(
        &self,
        token: &SessionToken,
        params: CreateTaxonomyParams,
    ) -> Result<String, RepoError> {
        let body = DocumentFields {
            fields: taxonomy_to_fields(&params.key, &params.value),
        };
        let request = self
            .http
            .post(self.collection_url(params.kind.collection()))
            .header(reqwest::header::AUTHORIZATION, bearer(token))
            .json(&body);
        let created: Document = self.send("create_taxonomy", request).await?;
        Ok(created.id().to_string())
    }

    async fn delete_taxonomy(
        &self,
        token: &SessionToken,
        kind: TaxonomyKind,
        id: &str,
    ) -> Result<(), RepoError> {
        let request = self
            .http
            .delete(self.document_url(kind.collection(), id)?)
            .query(&[("currentDocument.exists", "true")])
            .header(reqwest::header::AUTHORIZATION, bearer(token));
        let _: serde_json::Value = self.send("delete_taxonomy", request).await?;
        Ok(())
    }
}
