use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::application::error::ErrorReport;
use crate::application::images::{ImageError, ImageHostError};

use super::super::api::error::{ApiError, codes};
use super::super::api::models::{ImageDeleteRequest, ImageDeleteResponse, UploadResponse};
use super::AdminState;

const SOURCE: &str = "infra::http::admin::images";

struct FilePart {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

/// Pull the `file` field; other fields are ignored.
async fn read_file_part(multipart: &mut Multipart) -> Result<FilePart, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                let status = err.status();
                error!(
                    target = SOURCE,
                    status = status.as_u16(),
                    error = %err,
                    "failed to read multipart payload"
                );
                return Err(match status {
                    StatusCode::PAYLOAD_TOO_LARGE => ApiError::new(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        codes::UPLOAD,
                        "Image exceeds the upload limit",
                        None,
                    ),
                    _ => ApiError::bad_request("Invalid form data", Some(err.to_string())),
                });
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .to_string()
            });
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request("Invalid form data", Some(err.to_string())))?;

        return Ok(FilePart {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(ApiError::new(
        StatusCode::BAD_REQUEST,
        codes::UPLOAD,
        "No file provided",
        None,
    ))
}

pub(super) async fn upload_image(
    State(state): State<AdminState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let part = read_file_part(&mut multipart).await?;
    let hosted = state
        .images
        .upload(&part.file_name, &part.content_type, part.bytes)
        .await
        .map_err(ApiError::from_image)?;

    Ok(Json(UploadResponse {
        url: hosted.url,
        public_id: hosted.public_id,
    }))
}

fn delete_response(status: StatusCode, success: bool, message: &str, details: Value) -> Response {
    let body = ImageDeleteResponse {
        success,
        message: message.to_string(),
        details,
    };
    let mut response = (status, Json(body)).into_response();
    if !success {
        ErrorReport::from_message(SOURCE, status, message.to_string()).attach(&mut response);
    }
    response
}

/// Delete a hosted image by public id.
///
/// A host that answers with anything other than `"ok"` is a rejection (400); only
/// transport-level failures and missing credentials answer 500.
pub(super) async fn delete_image(
    State(state): State<AdminState>,
    Json(request): Json<ImageDeleteRequest>,
) -> Response {
    let public_id = request.public_id.unwrap_or_default();
    if public_id.trim().is_empty() {
        return delete_response(
            StatusCode::BAD_REQUEST,
            false,
            "Public ID is required",
            Value::Null,
        );
    }

    match state.images.destroy(&public_id).await {
        Ok(report) if report.is_ok() => {
            info!(
                target = "butik::http::admin",
                public_id = %public_id,
                image_url = request.image_url.as_deref().unwrap_or(""),
                "image deleted"
            );
            delete_response(
                StatusCode::OK,
                true,
                "Image deleted successfully",
                report.raw,
            )
        }
        Ok(report) => {
            warn!(
                target = "butik::http::admin",
                public_id = %public_id,
                result = %report.result,
                "image host declined deletion"
            );
            delete_response(
                StatusCode::BAD_REQUEST,
                false,
                "Failed to delete image",
                report.raw,
            )
        }
        Err(ImageError::Rule(rule)) => delete_response(
            StatusCode::BAD_REQUEST,
            false,
            "Failed to delete image",
            json!({ "error": rule.to_string() }),
        ),
        Err(ImageError::Host(ImageHostError::Rejected { status, message })) => delete_response(
            StatusCode::BAD_REQUEST,
            false,
            "Failed to delete image",
            json!({ "status": status, "error": message }),
        ),
        Err(ImageError::Host(err)) => delete_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            false,
            "Error deleting image",
            json!({ "error": err.to_string() }),
        ),
    }
}
