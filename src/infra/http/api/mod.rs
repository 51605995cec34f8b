//! Read-only storefront API served from the shared catalog snapshot.

pub mod error;
mod handlers;
pub mod models;
mod state;

pub use state::ApiState;

use axum::{Router, routing::get};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/catalog/categories", get(handlers::list_categories))
        .route(
            "/api/catalog/product-types",
            get(handlers::list_product_types),
        )
        .route("/api/catalog/products", get(handlers::list_products))
        .route("/api/catalog/products/{id}", get(handlers::get_product))
        .route("/api/catalog/best-sellers", get(handlers::list_best_sellers))
        .with_state(state)
}
