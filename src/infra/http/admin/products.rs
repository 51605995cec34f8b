use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::session::SessionToken;
use crate::domain::types::ProductFilter;

use super::super::api::error::ApiError;
use super::super::api::models::{
    AdminProductsQuery, CreatedResponse, ProductListResponse, ProductPayload, ProductView,
};
use super::AdminState;

/// At most one server-side filter applies: category, then type, then best-seller flag.
fn admin_filter(query: AdminProductsQuery) -> Option<ProductFilter> {
    let present = |value: Option<String>| {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    present(query.category)
        .map(ProductFilter::Category)
        .or_else(|| present(query.product_type).map(ProductFilter::ProductType))
        .or_else(|| query.best_seller.map(ProductFilter::BestSeller))
}

pub(super) async fn list_products(
    State(state): State<AdminState>,
    Query(query): Query<AdminProductsQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state.products.list(admin_filter(query)).await?;
    Ok(Json(ProductListResponse::new(products)))
}

pub(super) async fn get_product(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>, ApiError> {
    let product = state.products.find(&id).await?;
    Ok(Json(ProductView::from(product)))
}

pub(super) async fn create_product(
    State(state): State<AdminState>,
    Extension(token): Extension<SessionToken>,
    Json(payload): Json<ProductPayload>,
) -> Result<Response, ApiError> {
    let id = state.products.create(&token, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })).into_response())
}

pub(super) async fn update_product(
    State(state): State<AdminState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<ProductView>, ApiError> {
    let product = state.products.update(&token, &id, payload.into()).await?;
    Ok(Json(ProductView::from(product)))
}

pub(super) async fn delete_product(
    State(state): State<AdminState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.products.delete(&token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
