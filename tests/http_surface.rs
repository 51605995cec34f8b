use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use butik::application::admin::{AdminProductService, AdminTaxonomyService};
use butik::application::images::{
    DestroyReport, HostedImage, ImageHost, ImageHostError, ImageService, ImageUpload,
};
use butik::application::repos::{
    CatalogSource, CatalogWriteRepo, CreateProductParams, CreateTaxonomyParams, ProductQuery,
    RepoError, UpdateProductParams,
};
use butik::application::session::{
    IdentityError, IdentityProvider, SessionService, SessionToken, SignedIn,
};
use butik::cache::CatalogCache;
use butik::config::SessionSettings;
use butik::domain::entities::{Product, TaxonomyRecord};
use butik::domain::types::TaxonomyKind;
use butik::infra::http::{AdminState, build_admin_router, build_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn product(id: &str, name: &str, category: &str, best: bool) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        price: 150_000,
        category: category.into(),
        product_type: "dewasa".into(),
        description: format!("{name} bahan katun"),
        image: String::new(),
        is_best_seller: best,
        rating: 0.0,
        sold: 0,
        shopee_link: String::new(),
        created_at: None,
        updated_at: None,
        created_by: None,
        updated_by: None,
    }
}

#[derive(Default)]
struct StubStore {
    products: Mutex<Vec<Product>>,
    taxonomy: Mutex<Vec<(TaxonomyKind, TaxonomyRecord)>>,
    fail_reads: AtomicBool,
    product_reads: AtomicUsize,
}

impl StubStore {
    fn seeded() -> Arc<Self> {
        let store = Self::default();
        *store.products.lock().unwrap() = vec![
            product("p1", "Gamis Premium", "gamis", true),
            product("p2", "Koko Anak", "koko", false),
        ];
        *store.taxonomy.lock().unwrap() = vec![
            (
                TaxonomyKind::Category,
                TaxonomyRecord {
                    id: "c1".into(),
                    key: "gamis".into(),
                    value: "Gamis".into(),
                },
            ),
            (
                TaxonomyKind::ProductType,
                TaxonomyRecord {
                    id: "t1".into(),
                    key: "dewasa".into(),
                    value: "Dewasa".into(),
                },
            ),
        ];
        Arc::new(store)
    }
}

#[async_trait]
impl CatalogSource for StubStore {
    async fn list_taxonomy(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyRecord>, RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(self
            .taxonomy
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn list_products(&self, _query: &ProductQuery) -> Result<Vec<Product>, RepoError> {
        self.product_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(self.products.lock().unwrap().clone())
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>, RepoError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|product| product.id == id)
            .cloned())
    }
}

#[async_trait]
impl CatalogWriteRepo for StubStore {
    async fn create_product(
        &self,
        _token: &SessionToken,
        params: CreateProductParams,
    ) -> Result<String, RepoError> {
        let mut products = self.products.lock().unwrap();
        let id = format!("p{}", products.len() + 1);
        let mut created = product(&id, &params.fields.name, &params.fields.category, false);
        created.price = params.fields.price;
        products.push(created);
        Ok(id)
    }

    async fn update_product(
        &self,
        _token: &SessionToken,
        params: UpdateProductParams,
    ) -> Result<(), RepoError> {
        let mut products = self.products.lock().unwrap();
        let existing = products
            .iter_mut()
            .find(|product| product.id == params.id)
            .ok_or(RepoError::NotFound)?;
        existing.name = params.fields.name;
        existing.image = params.fields.image;
        Ok(())
    }

    async fn delete_product(&self, _token: &SessionToken, id: &str) -> Result<(), RepoError> {
        self.products.lock().unwrap().retain(|product| product.id != id);
        Ok(())
    }

    async fn create_taxonomy(
        &self,
        _token: &SessionToken,
        params: CreateTaxonomyParams,
    ) -> Result<String, RepoError> {
        let mut taxonomy = self.taxonomy.lock().unwrap();
        let id = format!("x{}", taxonomy.len() + 1);
        taxonomy.push((
            params.kind,
            TaxonomyRecord {
                id: id.clone(),
                key: params.key,
                value: params.value,
            },
        ));
        Ok(id)
    }

    async fn delete_taxonomy(
        &self,
        _token: &SessionToken,
        kind: TaxonomyKind,
        id: &str,
    ) -> Result<(), RepoError> {
        self.taxonomy
            .lock()
            .unwrap()
            .retain(|(k, record)| !(*k == kind && record.id == id));
        Ok(())
    }
}

/// `None` makes destroy fail at the transport level.
struct StubHost {
    destroy_result: Mutex<Option<String>>,
}

#[async_trait]
impl ImageHost for StubHost {
    async fn upload(&self, upload: ImageUpload) -> Result<HostedImage, ImageHostError> {
        Ok(HostedImage {
            url: format!(
                "https://res.cloudinary.com/demo/image/upload/v1/{}",
                upload.public_id
            ),
            public_id: Some(upload.public_id),
        })
    }

    async fn destroy(&self, _public_id: &str) -> Result<DestroyReport, ImageHostError> {
        match self.destroy_result.lock().unwrap().clone() {
            Some(result) => Ok(DestroyReport {
                raw: json!({ "result": result }),
                result,
            }),
            None => Err(ImageHostError::Transport("connection reset".into())),
        }
    }
}

struct StubIdentity;

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, IdentityError> {
        if password != "rahasia" {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(SignedIn {
            token: SessionToken::new("id-token").expect("token"),
            email: email.to_string(),
            expires_in: Duration::from_secs(3600),
        })
    }
}

struct AdminHarness {
    router: Router,
    catalog: CatalogCache,
    host: Arc<StubHost>,
}

fn admin_harness(store: Arc<StubStore>) -> AdminHarness {
    let catalog = CatalogCache::new(store.clone());
    let host = Arc::new(StubHost {
        destroy_result: Mutex::new(Some("ok".into())),
    });
    let images = ImageService::new(host.clone(), "shop", 1024);
    let state = AdminState {
        session: Arc::new(SessionService::new(Arc::new(StubIdentity))),
        session_settings: SessionSettings {
            cookie_name: "session".into(),
            max_age: Duration::from_secs(604_800),
            secure: false,
        },
        products: Arc::new(AdminProductService::new(
            store.clone(),
            store.clone(),
            images.clone(),
        )),
        taxonomy: Arc::new(AdminTaxonomyService::new(store.clone(), store)),
        images: Arc::new(images),
        catalog: catalog.clone(),
    };
    AdminHarness {
        router: build_admin_router(state),
        catalog,
        host,
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

async fn text_body(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, "session=id-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_probe_answers_no_content() {
    let router = build_router(CatalogCache::new(StubStore::seeded()));
    let response = router.oneshot(get("/_health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn storefront_browses_the_snapshot() {
    let store = StubStore::seeded();
    let router = build_router(CatalogCache::new(store.clone()));

    let response = router
        .clone()
        .oneshot(get("/api/catalog/categories"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["entries"]["gamis"]["value"], "Gamis");

    let response = router
        .clone()
        .oneshot(get("/api/catalog/products?category=gamis&q=PREMIUM"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["products"][0]["id"], "p1");

    let response = router
        .clone()
        .oneshot(get("/api/catalog/best-sellers"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["products"][0]["isBestSeller"], true);

    let response = router
        .oneshot(get("/api/catalog/products/missing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.product_reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_failure_answers_retryable_503() {
    let store = StubStore::seeded();
    store.fail_reads.store(true, Ordering::SeqCst);
    let router = build_router(CatalogCache::new(store.clone()));

    let response = router
        .clone()
        .oneshot(get("/api/catalog/products"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "catalog_unavailable");
    assert_eq!(body["error"]["hint"], "retry");

    store.fail_reads.store(false, Ordering::SeqCst);
    let response = router.oneshot(get("/api/catalog/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["total"], 2);
}

#[tokio::test]
async fn admin_routes_redirect_without_session() {
    let harness = admin_harness(StubStore::seeded());

    let response = harness
        .router
        .clone()
        .oneshot(get("/admin/products"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin/login");

    let response = harness.router.oneshot(get("/admin/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let harness = admin_harness(StubStore::seeded());
    let request = Request::builder()
        .method("POST")
        .uri("/admin/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=admin%40toko.id&password=rahasia"))
        .unwrap();

    let response = harness.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin/products");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session=id-token"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));

    let request = Request::builder()
        .method("POST")
        .uri("/admin/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=admin%40toko.id&password=salah"))
        .unwrap();
    let response = harness.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let page = text_body(response).await;
    assert!(page.contains("role=\"alert\""));
    assert!(page.contains("Invalid email or password"));
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let harness = admin_harness(StubStore::seeded());
    let response = harness
        .router
        .oneshot(authed("POST", "/admin/logout", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn successful_writes_invalidate_the_catalog() {
    let harness = admin_harness(StubStore::seeded());
    harness.catalog.all_products().await.expect("primed");
    assert!(harness.catalog.is_initialized());

    let response = harness
        .router
        .clone()
        .oneshot(authed(
            "POST",
            "/admin/products",
            json!({ "name": "", "price": 10, "category": "gamis", "type": "dewasa" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(harness.catalog.is_initialized());

    let response = harness
        .router
        .clone()
        .oneshot(authed(
            "POST",
            "/admin/products",
            json!({ "name": "Tunik", "price": "95000", "category": "gamis", "type": "dewasa" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["id"], "p3");
    assert!(!harness.catalog.is_initialized());

    let products = harness.catalog.all_products().await.expect("reloaded");
    assert_eq!(products.len(), 3);

    let response = harness
        .router
        .oneshot(authed("DELETE", "/admin/categories/c1", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!harness.catalog.is_initialized());
}

#[tokio::test]
async fn image_delete_reports_host_outcome() {
    let harness = admin_harness(StubStore::seeded());

    let response = harness
        .router
        .clone()
        .oneshot(authed("POST", "/admin/images/delete", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);

    let response = harness
        .router
        .clone()
        .oneshot(authed(
            "POST",
            "/admin/images/delete",
            json!({ "publicId": "shop/1-a", "imageUrl": "https://res.cloudinary.com/demo/image/upload/v1/shop/1-a.png" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["details"]["result"], "ok");

    *harness.host.destroy_result.lock().unwrap() = Some("not found".into());
    let response = harness
        .router
        .clone()
        .oneshot(authed(
            "POST",
            "/admin/images/delete",
            json!({ "publicId": "shop/1-a" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    *harness.host.destroy_result.lock().unwrap() = None;
    let response = harness
        .router
        .oneshot(authed(
            "POST",
            "/admin/images/delete",
            json!({ "publicId": "shop/1-a" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn image_upload_returns_hosted_url() {
    let harness = admin_harness(StubStore::seeded());
    let boundary = "XBOUNDARY";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"gamis baru.png\"\r\nContent-Type: image/png\r\n\r\n\x01\x02\x03\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/admin/images")
        .header(header::COOKIE, "session=id-token")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = harness.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let url = body["url"].as_str().expect("url");
    assert!(url.contains("/shop/"));
    assert!(url.ends_with("-gamis-baru.png"));
}
