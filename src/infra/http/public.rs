use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::cache::CatalogCache;

use super::api::{ApiState, build_api_router};
use super::middleware::{log_responses, set_request_context};

/// Storefront listener: catalog API plus the liveness probe.
pub fn build_router(catalog: CatalogCache) -> Router {
    Router::new()
        .route("/_health", get(health))
        .merge(build_api_router(ApiState { catalog }))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
