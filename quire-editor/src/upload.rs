//! Validation of image payloads before they enter a document.
//!
//! The payload is checked for emptiness, size and type, and only then turned
//! into a `data:` URI that a media node can reference. Storage of the bytes
//! anywhere else is up to the host.
use base64::{Engine, prelude::BASE64_STANDARD};
use log::warn;

use crate::error::UploadError;

/// Size ceiling and accepted MIME types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
  pub max_bytes:     usize,
  pub allowed_types: Vec<String>,
}

impl Default for UploadLimits {
  fn default() -> Self {
    Self {
      max_bytes:     5 * 1024 * 1024,
      allowed_types: [
        "image/png",
        "image/jpeg",
        "image/gif",
        "image/webp",
        "image/svg+xml",
      ]
      .into_iter()
      .map(String::from)
      .collect(),
    }
  }
}

/// An accepted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImage {
  pub mime:     &'static str,
  pub size:     usize,
  pub data_uri: String,
}

/// Identify the image format from its leading bytes.
#[must_use]
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
  if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
    return Some("image/png");
  }
  if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
    return Some("image/jpeg");
  }
  if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
    return Some("image/gif");
  }
  if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
    return Some("image/webp");
  }

  let head = &bytes[..bytes.len().min(1024)];
  let text = String::from_utf8_lossy(head);
  let text = text.trim_start_matches('\u{feff}').trim_start();
  if text.starts_with("<svg")
    || ((text.starts_with("<?xml") || text.starts_with("<!--")) && text.contains("<svg"))
  {
    return Some("image/svg+xml");
  }
  None
}

/// Check an uploaded payload and encode it as a `data:` URI.
///
/// `declared_mime` is what the client claimed; when given it must be an
/// `image/*` type, but the bytes decide the final type.
///
/// # Errors
///
/// Returns [`UploadError::Empty`], [`UploadError::TooLarge`] or
/// [`UploadError::NotAnImage`].
pub fn validate_image(
  bytes: &[u8],
  declared_mime: Option<&str>,
  limits: &UploadLimits,
) -> Result<ValidatedImage, UploadError> {
  let result = check(bytes, declared_mime, limits);
  if let Err(err) = &result {
    warn!("Rejected image upload: {err}");
  }
  result
}

fn check(
  bytes: &[u8],
  declared_mime: Option<&str>,
  limits: &UploadLimits,
) -> Result<ValidatedImage, UploadError> {
  if bytes.is_empty() {
    return Err(UploadError::Empty);
  }
  if bytes.len() > limits.max_bytes {
    return Err(UploadError::TooLarge {
      size:  bytes.len(),
      limit: limits.max_bytes,
    });
  }
  if let Some(declared) = declared_mime {
    if !declared.trim().to_ascii_lowercase().starts_with("image/") {
      return Err(UploadError::NotAnImage(declared.to_string()));
    }
  }

  let mime = sniff_image_type(bytes).ok_or_else(|| {
    UploadError::NotAnImage(declared_mime.unwrap_or("unknown").to_string())
  })?;
  if !limits.allowed_types.iter().any(|allowed| allowed == mime) {
    return Err(UploadError::NotAnImage(mime.to_string()));
  }

  Ok(ValidatedImage {
    mime,
    size: bytes.len(),
    data_uri: format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes)),
  })
}
