use axum::Json;
use axum::extract::{Path, Query, State};

use crate::cache::BrowseFilter;

use super::error::ApiError;
use super::models::{CatalogQuery, ProductListResponse, ProductView, TaxonomyMapResponse};
use super::state::ApiState;

pub(super) async fn list_categories(
    State(state): State<ApiState>,
) -> Result<Json<TaxonomyMapResponse>, ApiError> {
    let entries = state.catalog.categories().await?;
    Ok(Json(TaxonomyMapResponse { entries }))
}

pub(super) async fn list_product_types(
    State(state): State<ApiState>,
) -> Result<Json<TaxonomyMapResponse>, ApiError> {
    let entries = state.catalog.product_types().await?;
    Ok(Json(TaxonomyMapResponse { entries }))
}

pub(super) async fn list_products(
    State(state): State<ApiState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let filter = browse_filter(query);
    let products = state.catalog.browse(&filter).await?;
    Ok(Json(ProductListResponse::new(products)))
}

pub(super) async fn list_best_sellers(
    State(state): State<ApiState>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state.catalog.best_sellers().await?;
    Ok(Json(ProductListResponse::new(products)))
}

pub(super) async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>, ApiError> {
    state
        .catalog
        .product(&id)
        .await?
        .map(|product| Json(ProductView::from(product)))
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// Blank filter values mean "no filter"; a missing query string searches for "".
fn browse_filter(query: CatalogQuery) -> BrowseFilter {
    fn present(value: Option<String>) -> Option<String> {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    BrowseFilter {
        category: present(query.category),
        product_type: present(query.product_type),
        query: query.q.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filters_are_dropped() {
        let filter = browse_filter(CatalogQuery {
            category: Some("  ".into()),
            product_type: Some("anak".into()),
            q: None,
        });
        assert_eq!(filter.category, None);
        assert_eq!(filter.product_type.as_deref(), Some("anak"));
        assert_eq!(filter.query, "");
    }
}
