use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::{images::ImageError, repos::RepoError, session::IdentityError},
    cache::CatalogError,
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Diagnostic chain attached to error responses so the response logger can print it.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Failures surfaced by the admin and catalog services.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::NotFound { .. })
            | AppError::Repo(RepoError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Image(ImageError::Rule(_)) => StatusCode::BAD_REQUEST,
            AppError::Identity(IdentityError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Repo(RepoError::PermissionDenied { .. }) => StatusCode::FORBIDDEN,
            AppError::Catalog(_)
            | AppError::Identity(IdentityError::Unavailable(_))
            | AppError::Repo(RepoError::Timeout | RepoError::Transport(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Repo(RepoError::Rejected { .. } | RepoError::Malformed { .. })
            | AppError::Image(ImageError::Host(_)) => StatusCode::BAD_GATEWAY,
            AppError::Infra(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn presentation_message(&self) -> &'static str {
        match self.status_code() {
            StatusCode::NOT_FOUND => "Resource not found",
            StatusCode::BAD_REQUEST => "Request could not be processed",
            StatusCode::UNAUTHORIZED => "Sign-in required",
            StatusCode::FORBIDDEN => "Permission denied",
            StatusCode::SERVICE_UNAVAILABLE => "Service temporarily unavailable",
            StatusCode::BAD_GATEWAY => "Upstream service failed",
            _ => "Unexpected error occurred",
        }
    }

    /// Message safe to show on an admin form; validation details are passed through.
    pub fn form_message(&self) -> String {
        match self {
            AppError::Domain(DomainError::Validation { message, .. }) => message.clone(),
            AppError::Image(ImageError::Rule(err)) => err.to_string(),
            AppError::Identity(IdentityError::InvalidCredentials) => {
                "Invalid email or password".to_string()
            }
            other => other.presentation_message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_failures_map_to_unavailable() {
        let err = AppError::from(CatalogError::Fetch(std::sync::Arc::new(RepoError::Timeout)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn validation_messages_reach_forms() {
        let err = AppError::from(DomainError::validation("name", "please fill in all fields"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.form_message(), "please fill in all fields");
    }

    #[test]
    fn report_walks_error_sources() {
        let err = AppError::from(CatalogError::Fetch(std::sync::Arc::new(
            RepoError::Transport("reset".into()),
        )));
        let report = ErrorReport::from_error("test", StatusCode::SERVICE_UNAVAILABLE, &err);
        assert_eq!(report.messages.len(), 2);
        assert!(report.messages[1].contains("reset"));
    }
}
