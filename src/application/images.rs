//! Product picture uploads and removals against the hosted image service.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::domain::uploads::{ImageRuleError, extract_public_id, hosted_public_id, validate_image};

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("image host request failed: {0}")]
    Transport(String),
    #[error("image host rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid image host response: {0}")]
    InvalidResponse(String),
    #[error("image host is not configured: missing `{0}`")]
    NotConfigured(&'static str),
}

impl ImageHostError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub public_id: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    pub url: String,
    pub public_id: Option<String>,
}

/// Answer of a destroy call. Only a `result` of `"ok"` means the image is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct DestroyReport {
    pub result: String,
    pub raw: Value,
}

impl DestroyReport {
    pub fn is_ok(&self) -> bool {
        self.result == "ok"
    }
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, upload: ImageUpload) -> Result<HostedImage, ImageHostError>;

    async fn destroy(&self, public_id: &str) -> Result<DestroyReport, ImageHostError>;
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Rule(#[from] ImageRuleError),
    #[error(transparent)]
    Host(#[from] ImageHostError),
}

#[derive(Clone)]
pub struct ImageService {
    host: Arc<dyn ImageHost>,
    folder: String,
    max_bytes: u64,
}

impl ImageService {
    pub fn new(host: Arc<dyn ImageHost>, folder: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            host,
            folder: folder.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate and upload one picture, returning its durable URL.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<HostedImage, ImageError> {
        validate_image(content_type, bytes.len() as u64, self.max_bytes)?;

        let public_id = hosted_public_id(&self.folder, file_name, OffsetDateTime::now_utc());
        let hosted = self
            .host
            .upload(ImageUpload {
                public_id: public_id.clone(),
                file_name: file_name.to_string(),
                content_type: content_type.to_string(),
                bytes,
            })
            .await?;

        info!(
            target = "butik::images",
            public_id = %public_id,
            url = %hosted.url,
            "image uploaded"
        );
        Ok(hosted)
    }

    pub async fn destroy(&self, public_id: &str) -> Result<DestroyReport, ImageError> {
        let public_id = public_id.trim();
        if public_id.is_empty() {
            return Err(ImageRuleError::MissingPublicId.into());
        }
        let report = self.host.destroy(public_id).await?;
        info!(
            target = "butik::images",
            public_id,
            result = %report.result,
            "image destroy answered"
        );
        Ok(report)
    }

    /// Remove the picture behind a hosted URL, logging instead of failing.
    ///
    /// Returns whether the host confirmed the deletion.
    pub async fn discard_url(&self, image_url: &str) -> bool {
        if image_url.trim().is_empty() {
            return false;
        }

        let public_id = match extract_public_id(image_url) {
            Ok(public_id) => public_id,
            Err(err) => {
                warn!(
                    target = "butik::images",
                    image_url,
                    error = %err,
                    "skipping image cleanup"
                );
                return false;
            }
        };

        match self.destroy(&public_id).await {
            Ok(report) if report.is_ok() => true,
            Ok(report) => {
                warn!(
                    target = "butik::images",
                    public_id = %public_id,
                    result = %report.result,
                    "image host declined cleanup"
                );
                false
            }
            Err(err) => {
                warn!(
                    target = "butik::images",
                    public_id = %public_id,
                    error = %err,
                    "image cleanup failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::domain::uploads::DEFAULT_MAX_IMAGE_BYTES;

    /// In-memory host recording every call.
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        pub uploads: Mutex<Vec<ImageUpload>>,
        pub destroyed: Mutex<Vec<String>>,
        pub destroy_result: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ImageHost for RecordingHost {
        async fn upload(&self, upload: ImageUpload) -> Result<HostedImage, ImageHostError> {
            let url = format!(
                "https://res.cloudinary.com/demo/image/upload/v1/{}.jpg",
                upload.public_id
            );
            let public_id = Some(upload.public_id.clone());
            self.uploads.lock().unwrap().push(upload);
            Ok(HostedImage { url, public_id })
        }

        async fn destroy(&self, public_id: &str) -> Result<DestroyReport, ImageHostError> {
            self.destroyed.lock().unwrap().push(public_id.to_string());
            let result = self
                .destroy_result
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "ok".to_string());
            Ok(DestroyReport {
                raw: serde_json::json!({ "result": result }),
                result,
            })
        }
    }

    fn service(host: Arc<RecordingHost>) -> ImageService {
        ImageService::new(host, "shop", DEFAULT_MAX_IMAGE_BYTES)
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_types_before_calling_host() {
        let host = Arc::new(RecordingHost::default());
        let err = service(host.clone())
            .upload("a.gif", "image/gif", Bytes::from_static(b"GIF89a"))
            .await
            .expect_err("gif rejected");

        assert!(matches!(err, ImageError::Rule(ImageRuleError::UnsupportedType(_))));
        assert!(host.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_requests_folder_scoped_public_id() {
        let host = Arc::new(RecordingHost::default());
        let hosted = service(host.clone())
            .upload("baju muslim.jpg", "image/jpeg", Bytes::from_static(b"\xff\xd8"))
            .await
            .expect("uploaded");

        let uploads = host.uploads.lock().unwrap();
        assert!(uploads[0].public_id.starts_with("shop/"));
        assert!(uploads[0].public_id.ends_with("-baju-muslim.jpg"));
        assert!(hosted.url.contains("/v1/shop/"));
    }

    #[tokio::test]
    async fn discard_url_extracts_public_id() {
        let host = Arc::new(RecordingHost::default());
        let confirmed = service(host.clone())
            .discard_url("https://res.cloudinary.com/demo/image/upload/v99/shop/1-a.png")
            .await;

        assert!(confirmed);
        assert_eq!(*host.destroyed.lock().unwrap(), ["shop/1-a"]);
    }

    #[tokio::test]
    async fn discard_url_tolerates_foreign_urls_and_declines() {
        let host = Arc::new(RecordingHost::default());
        let images = service(host.clone());

        assert!(!images.discard_url("https://example.com/a.png").await);
        assert!(host.destroyed.lock().unwrap().is_empty());

        *host.destroy_result.lock().unwrap() = Some("not found".into());
        assert!(
            !images
                .discard_url("https://res.cloudinary.com/demo/image/upload/v1/x.png")
                .await
        );
    }
}
