use bytes::Bytes;
use butik::application::images::{ImageHost, ImageHostError, ImageUpload};
use butik::config::{CloudinarySettings, Secret};
use butik::infra::cloudinary::CloudinaryClient;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;

fn client(server: &MockServer, credentials: bool) -> CloudinaryClient {
    let settings = CloudinarySettings {
        base_url: Url::parse(&server.base_url()).expect("mock url"),
        cloud_name: "demo".into(),
        upload_preset: "unsigned-shop".into(),
        api_key: credentials.then(|| "123456".to_string()),
        api_secret: credentials.then(|| Secret::new("abcd")),
        folder: "shop".into(),
        max_image_bytes: 1024,
    };
    CloudinaryClient::new(reqwest::Client::new(), &settings)
}

fn upload() -> ImageUpload {
    ImageUpload {
        public_id: "shop/1714521600000-gamis".into(),
        file_name: "gamis.png".into(),
        content_type: "image/png".into(),
        bytes: Bytes::from_static(b"\x89PNG\r\n"),
    }
}

#[tokio::test]
async fn upload_returns_secure_url() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/v1_1/demo/image/upload");
        then.status(200).json_body(json!({
            "public_id": "shop/1714521600000-gamis",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1714521600/shop/1714521600000-gamis.png"
        }));
    });

    let hosted = client(&server, false).upload(upload()).await.expect("upload");

    mock.assert();
    assert!(hosted.url.ends_with("/shop/1714521600000-gamis.png"));
    assert_eq!(hosted.public_id.as_deref(), Some("shop/1714521600000-gamis"));
}

#[tokio::test]
async fn upload_surfaces_host_error_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/v1_1/demo/image/upload");
        then.status(400)
            .json_body(json!({ "error": { "message": "Upload preset not found" } }));
    });

    let err = client(&server, false)
        .upload(upload())
        .await
        .expect_err("rejected");
    match err {
        ImageHostError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Upload preset not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn upload_without_secure_url_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/v1_1/demo/image/upload");
        then.status(200).json_body(json!({ "public_id": "shop/x" }));
    });

    let err = client(&server, false)
        .upload(upload())
        .await
        .expect_err("missing url");
    assert!(matches!(err, ImageHostError::InvalidResponse(_)));
}

#[tokio::test]
async fn destroy_sends_signed_form() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/v1_1/demo/image/destroy")
            .form_urlencoded_tuple("public_id", "shop/1-a")
            .form_urlencoded_tuple("api_key", "123456")
            .form_urlencoded_tuple("signature_algorithm", "sha256")
            .form_urlencoded_tuple_exists("signature")
            .form_urlencoded_tuple_exists("timestamp");
        then.status(200).json_body(json!({ "result": "ok" }));
    });

    let report = client(&server, true)
        .destroy("shop/1-a")
        .await
        .expect("destroy");

    mock.assert();
    assert!(report.is_ok());
}

#[tokio::test]
async fn destroy_reports_not_found_results() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/v1_1/demo/image/destroy");
        then.status(200).json_body(json!({ "result": "not found" }));
    });

    let report = client(&server, true)
        .destroy("shop/missing")
        .await
        .expect("answered");
    assert!(!report.is_ok());
    assert_eq!(report.raw["result"], "not found");
}

#[tokio::test]
async fn destroy_requires_credentials() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/v1_1/demo/image/destroy");
        then.status(200).json_body(json!({ "result": "ok" }));
    });

    let err = client(&server, false)
        .destroy("shop/1-a")
        .await
        .expect_err("no credentials");
    assert!(matches!(err, ImageHostError::NotConfigured(_)));
    mock.assert_calls(0);
}
