use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{application::error::ErrorReport, cache::CatalogCache};

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "butik::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "butik::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}

/// Drop the storefront snapshot after any successful admin write.
///
/// Reads, failed writes, and sign-in/sign-out leave the cache untouched.
pub async fn invalidate_catalog_on_write(
    State(cache): State<CatalogCache>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if is_catalog_write(&method, &path) && response.status().is_success() {
        debug!(
            target = "butik::http::admin",
            method = %method,
            path = %path,
            "admin write succeeded; invalidating catalog"
        );
        cache.invalidate();
    }

    response
}

fn is_catalog_write(method: &Method, path: &str) -> bool {
    let writes = matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    );
    let catalog_path = ["/admin/products", "/admin/categories", "/admin/product-types"]
        .iter()
        .any(|prefix| path.starts_with(prefix));
    writes && catalog_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_catalog_mutations_count_as_writes() {
        assert!(is_catalog_write(&Method::POST, "/admin/products"));
        assert!(is_catalog_write(&Method::DELETE, "/admin/categories/c1"));
        assert!(is_catalog_write(&Method::PATCH, "/admin/products/p1"));
        assert!(!is_catalog_write(&Method::GET, "/admin/products"));
        assert!(!is_catalog_write(&Method::POST, "/admin/login"));
        assert!(!is_catalog_write(&Method::POST, "/admin/images"));
    }
}
