//! Image host adapter over the Cloudinary upload API.

use async_trait::async_trait;
use metrics::counter;
use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tracing::debug;

use crate::application::images::{
    DestroyReport, HostedImage, ImageHost, ImageHostError, ImageUpload,
};
use crate::config::{CloudinarySettings, Secret};

#[derive(Clone)]
pub struct CloudinaryClient {
    http: Client,
    image_url: String,
    upload_preset: String,
    credentials: Option<(String, Secret)>,
}

impl CloudinaryClient {
    pub fn new(http: Client, settings: &CloudinarySettings) -> Self {
        let image_url = format!(
            "{}/v1_1/{}/image",
            settings.base_url.as_str().trim_end_matches('/'),
            settings.cloud_name,
        );
        let credentials = settings
            .api_key
            .clone()
            .zip(settings.api_secret.clone());
        Self {
            http,
            image_url,
            upload_preset: settings.upload_preset.clone(),
            credentials,
        }
    }
}

/// `hex(sha256("public_id={id}&timestamp={ts}{secret}"))`.
pub fn destroy_signature(public_id: &str, timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("public_id={public_id}&timestamp={timestamp}").as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    public_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorMessage {
    #[serde(default)]
    message: String,
}

fn rejected(status: StatusCode, body: &[u8]) -> ImageHostError {
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|body| body.error)
        .map(|error| error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    ImageHostError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, upload: ImageUpload) -> Result<HostedImage, ImageHostError> {
        counter!("butik_image_requests_total", "op" => "upload").increment(1);

        let file = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|err| ImageHostError::InvalidResponse(err.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone())
            .text("public_id", upload.public_id);

        let response = self
            .http
            .post(format!("{}/upload", self.image_url))
            .multipart(form)
            .send()
            .await
            .map_err(ImageHostError::transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ImageHostError::transport)?;
        debug!(target = "butik::cloudinary", status = status.as_u16(), "upload answered");

        if !status.is_success() {
            return Err(rejected(status, &body));
        }

        let parsed: UploadResponse = serde_json::from_slice(&body)
            .map_err(|err| ImageHostError::InvalidResponse(err.to_string()))?;
        let url = parsed
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ImageHostError::InvalidResponse("missing image URL".to_string()))?;

        Ok(HostedImage {
            url,
            public_id: parsed.public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<DestroyReport, ImageHostError> {
        let (api_key, api_secret) = self
            .credentials
            .as_ref()
            .ok_or(ImageHostError::NotConfigured("cloudinary.api_secret"))?;
        counter!("butik_image_requests_total", "op" => "destroy").increment(1);

        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let signature = destroy_signature(public_id, timestamp, api_secret.expose());
        let timestamp = timestamp.to_string();
        let form = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", api_key.as_str()),
            ("signature_algorithm", "sha256"),
            ("signature", signature.as_str()),
        ];

        let response = self
            .http
            .post(format!("{}/destroy", self.image_url))
            .form(&form)
            .send()
            .await
            .map_err(ImageHostError::transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(ImageHostError::transport)?;
        debug!(target = "butik::cloudinary", status = status.as_u16(), public_id, "destroy answered");

        if !status.is_success() {
            return Err(rejected(status, &body));
        }

        let raw: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|err| ImageHostError::InvalidResponse(err.to_string()))?;
        let result = raw
            .get("result")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(DestroyReport { result, raw })
    }
}
