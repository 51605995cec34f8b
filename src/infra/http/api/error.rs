use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::admin::{AdminProductError, AdminTaxonomyError};
use crate::application::error::ErrorReport;
use crate::application::images::{ImageError, ImageHostError};
use crate::application::repos::RepoError;
use crate::cache::CatalogError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const CATALOG_UNAVAILABLE: &str = "catalog_unavailable";
    pub const STORE_TIMEOUT: &str = "store_timeout";
    pub const STORE: &str = "store_error";
    pub const UPLOAD: &str = "upload_error";
    pub const IMAGE_HOST: &str = "image_host_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn from_catalog(err: CatalogError) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::CATALOG_UNAVAILABLE,
            "Catalog is temporarily unavailable",
            Some("retry".to_string()),
        )
        .with_detail(&err)
    }

    pub fn from_repo(err: RepoError) -> Self {
        match &err {
            RepoError::NotFound => Self::not_found("Resource not found"),
            RepoError::PermissionDenied { message } => Self::new(
                StatusCode::FORBIDDEN,
                codes::FORBIDDEN,
                "Document store denied the request",
                Some(message.clone()),
            ),
            RepoError::Timeout => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::STORE_TIMEOUT,
                "Document store timeout",
                None,
            ),
            RepoError::Transport(message) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::STORE,
                "Document store unreachable",
                Some(message.clone()),
            ),
            RepoError::Rejected { message, .. } => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::STORE,
                "Document store rejected the request",
                Some(message.clone()),
            ),
            RepoError::Malformed { .. } => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::STORE,
                "Stored document is malformed",
                Some(err.to_string()),
            ),
        }
    }

    pub fn from_domain(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } => Self::not_found("Resource not found"),
            DomainError::Validation { field, message } => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid input",
                Some(format!("{field}: {message}")),
            ),
        }
    }

    pub fn from_image(err: ImageError) -> Self {
        match err {
            ImageError::Rule(rule) => Self::new(
                StatusCode::BAD_REQUEST,
                codes::UPLOAD,
                "Image rejected",
                Some(rule.to_string()),
            ),
            ImageError::Host(ImageHostError::Rejected { message, .. }) => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::IMAGE_HOST,
                "Image host rejected the request",
                Some(message),
            ),
            ImageError::Host(other) => Self::new(
                StatusCode::BAD_GATEWAY,
                codes::IMAGE_HOST,
                "Image host request failed",
                Some(other.to_string()),
            ),
        }
    }

    fn with_detail(mut self, err: &dyn std::error::Error) -> Self {
        if self.hint.is_none() {
            self.hint = Some(err.to_string());
        }
        self
    }
}

impl From<AdminProductError> for ApiError {
    fn from(err: AdminProductError) -> Self {
        match err {
            AdminProductError::NotFound => Self::not_found("Product not found"),
            AdminProductError::Invalid(err) => Self::from_domain(err),
            AdminProductError::Repo(err) => Self::from_repo(err),
        }
    }
}

impl From<AdminTaxonomyError> for ApiError {
    fn from(err: AdminTaxonomyError) -> Self {
        match err {
            AdminTaxonomyError::Invalid(err) => Self::from_domain(err),
            AdminTaxonomyError::Repo(err) => Self::from_repo(err),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self::from_catalog(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}
