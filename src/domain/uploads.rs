//! Image-specific helpers and invariants for hosted product pictures.

use thiserror::Error;
use time::OffsetDateTime;

/// Content types the image host accepts from the admin dashboard.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Default ceiling for a single product image.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageRuleError {
    #[error("no file provided for upload")]
    Empty,
    #[error("invalid file type `{0}`; please upload JPEG, PNG, or WebP images only")]
    UnsupportedType(String),
    #[error("file size too large; maximum size is {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("no image URL provided")]
    MissingUrl,
    #[error("public id is required")]
    MissingPublicId,
    #[error("invalid image URL format: {0}")]
    InvalidUrl(String),
}

/// Check an upload against the accepted types and size ceiling before any network call.
pub fn validate_image(content_type: &str, size: u64, max_bytes: u64) -> Result<(), ImageRuleError> {
    if size == 0 {
        return Err(ImageRuleError::Empty);
    }
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_IMAGE_TYPES.contains(&essence.as_str()) {
        return Err(ImageRuleError::UnsupportedType(content_type.to_string()));
    }
    if size > max_bytes {
        return Err(ImageRuleError::TooLarge { limit: max_bytes });
    }
    Ok(())
}

/// Build the public id requested from the image host: `{folder}/{unix_millis}-{file-name}`.
///
/// Whitespace runs in the file name collapse to a single `-`.
pub fn hosted_public_id(folder: &str, file_name: &str, at: OffsetDateTime) -> String {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    let mut normalized = String::with_capacity(file_name.len());
    let mut in_whitespace = false;
    for ch in file_name.trim().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                normalized.push('-');
            }
            in_whitespace = true;
        } else {
            normalized.push(ch);
            in_whitespace = false;
        }
    }

    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{millis}-{normalized}")
    } else {
        format!("{folder}/{millis}-{normalized}")
    }
}

/// Recover the public id from a hosted URL of the form `.../v<version>/<publicId>.<ext>`.
///
/// The id is everything after the first version segment, minus the final extension.
pub fn extract_public_id(image_url: &str) -> Result<String, ImageRuleError> {
    let image_url = image_url.trim();
    if image_url.is_empty() {
        return Err(ImageRuleError::MissingUrl);
    }

    let rest = after_version_segment(image_url)
        .ok_or_else(|| ImageRuleError::InvalidUrl(image_url.to_string()))?;
    if rest.is_empty() {
        return Err(ImageRuleError::InvalidUrl(image_url.to_string()));
    }

    let last_slash = rest.rfind('/');
    let stripped = match rest.rfind('.') {
        Some(dot) if last_slash.is_none_or(|slash| dot > slash) && dot + 1 < rest.len() => {
            &rest[..dot]
        }
        _ => rest,
    };

    if stripped.is_empty() {
        Ok(rest.to_string())
    } else {
        Ok(stripped.to_string())
    }
}

fn after_version_segment(url: &str) -> Option<&str> {
    let bytes = url.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = url[search_from..].find("/v") {
        let start = search_from + offset + 2;
        let digits = bytes[start..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        let end = start + digits;
        if digits > 0 && bytes.get(end) == Some(&b'/') {
            return Some(&url[end + 1..]);
        }
        search_from = start;
    }
    None
}
