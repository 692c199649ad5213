//! Error types for the squadshot generation pipeline.

use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport-level failure talking to the remote model.
    #[error("Provider request failed{}: {message}", status_suffix(.status))]
    ProviderRequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    /// The remote call succeeded but carried no image payload.
    #[error("Content rejected: {0}")]
    ContentRejected(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Composition failed: {0}")]
    CompositionFailed(String),

    #[error("Image decode failed: {0}")]
    ImageDecode(String),

    #[error("Album incomplete, missing finished images for: {}", .0.join(", "))]
    AlbumIncomplete(Vec<String>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {}", code))
        .unwrap_or_default()
}

impl ApiError {
    /// Transport failures worth another attempt: 500/503 responses, or any
    /// failure whose message mentions an internal error.
    pub fn is_retriable(&self) -> bool {
        match self {
            ApiError::ProviderRequestFailed { status, message } => {
                matches!(status, Some(500) | Some(503))
                    || message.to_lowercase().contains("internal")
            }
            ApiError::ProviderError(message) => message.to_lowercase().contains("internal"),
            _ => false,
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

impl From<image::ImageError> for ApiError {
    fn from(err: image::ImageError) -> Self {
        ApiError::ImageDecode(err.to_string())
    }
}
