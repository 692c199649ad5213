//! Shared payload types: source photos and generated images.

use crate::error::ApiError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Binary image payload plus its mime type.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read an image file, inferring the mime type from its extension.
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ApiError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let mime_type = mime_for_path(path).unwrap_or("image/png");
        Ok(Self::new(mime_type, bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, ApiError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ApiError::ImageDecode("Data URI must start with 'data:'".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ApiError::ImageDecode("Data URI is missing a payload".to_string()))?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
            ApiError::ImageDecode("Only base64 data URIs are supported".to_string())
        })?;
        if mime_type.is_empty() {
            return Err(ApiError::ImageDecode(
                "Data URI is missing a mime type".to_string(),
            ));
        }
        let bytes = BASE64
            .decode(payload.as_bytes())
            .map_err(|e| ApiError::ImageDecode(format!("Invalid base64 payload: {}", e)))?;
        Ok(Self::new(mime_type, bytes))
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Decode into a raster with accessible natural dimensions.
    pub fn decode(&self) -> Result<DynamicImage, ApiError> {
        image::load_from_memory(&self.bytes)
            .map_err(|e| ApiError::ImageDecode(format!("{} payload: {}", self.mime_type, e)))
    }

    /// File extension matching the mime type.
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
