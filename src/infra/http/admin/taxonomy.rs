use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::session::SessionToken;
use crate::domain::types::TaxonomyKind;

use super::super::api::error::ApiError;
use super::super::api::models::{TaxonomyListResponse, TaxonomyPayload};
use super::AdminState;

async fn list(state: &AdminState, kind: TaxonomyKind) -> Result<Json<TaxonomyListResponse>, ApiError> {
    let entries = state.taxonomy.list(kind).await?;
    Ok(Json(TaxonomyListResponse { entries }))
}

async fn add(
    state: &AdminState,
    token: &SessionToken,
    kind: TaxonomyKind,
    payload: TaxonomyPayload,
) -> Result<Response, ApiError> {
    let record = state
        .taxonomy
        .add(token, kind, &payload.key, &payload.value)
        .await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

async fn delete(
    state: &AdminState,
    token: &SessionToken,
    kind: TaxonomyKind,
    id: &str,
) -> Result<StatusCode, ApiError> {
    state.taxonomy.delete(token, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_categories(
    State(state): State<AdminState>,
) -> Result<Json<TaxonomyListResponse>, ApiError> {
    list(&state, TaxonomyKind::Category).await
}

pub(super) async fn add_category(
    State(state): State<AdminState>,
    Extension(token): Extension<SessionToken>,
    Json(payload): Json<TaxonomyPayload>,
) -> Result<Response, ApiError> {
    add(&state, &token, TaxonomyKind::Category, payload).await
}

pub(super) async fn delete_category(
    State(state): State<AdminState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete(&state, &token, TaxonomyKind::Category, &id).await
}

pub(super) async fn list_product_types(
    State(state): State<AdminState>,
) -> Result<Json<TaxonomyListResponse>, ApiError> {
    list(&state, TaxonomyKind::ProductType).await
}

pub(super) async fn add_product_type(
    State(state): State<AdminState>,
    Extension(token): Extension<SessionToken>,
    Json(payload): Json<TaxonomyPayload>,
) -> Result<Response, ApiError> {
    add(&state, &token, TaxonomyKind::ProductType, payload).await
}

pub(super) async fn delete_product_type(
    State(state): State<AdminState>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete(&state, &token, TaxonomyKind::ProductType, &id).await
}
