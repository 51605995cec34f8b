mod images;
mod products;
mod session;
mod state;
mod taxonomy;

pub use state::AdminState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};

use super::middleware::{invalidate_catalog_on_write, log_responses, set_request_context};

/// Multipart framing allowance on top of the image ceiling.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_admin_router(state: AdminState) -> Router {
    let catalog = state.catalog.clone();
    let upload_body_limit = usize::try_from(state.images.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            session::LOGIN_PATH,
            get(session::login_form).post(session::login_submit),
        )
        .route("/admin/logout", post(session::logout))
        .route(
            "/admin/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/admin/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/admin/categories",
            get(taxonomy::list_categories).post(taxonomy::add_category),
        )
        .route(
            "/admin/categories/{id}",
            delete(taxonomy::delete_category),
        )
        .route(
            "/admin/product-types",
            get(taxonomy::list_product_types).post(taxonomy::add_product_type),
        )
        .route(
            "/admin/product-types/{id}",
            delete(taxonomy::delete_product_type),
        )
        .route(
            "/admin/images",
            post(images::upload_image).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/admin/images/delete", post(images::delete_image))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            catalog,
            invalidate_catalog_on_write,
        ))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}
