//! Model Provider Abstraction
//!
//! Transport boundary to the remote multimodal model. A single request carries
//! a free-text prompt, an optional source image, and the output modalities the
//! caller wants back. Everything above this layer (retries, prompt fallback,
//! classification parsing) is provider-agnostic and works against the
//! [`ImageModelClient`] trait, so tests can substitute fakes.

use crate::error::ApiError;
use crate::types::ImageData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod gemini;

pub use gemini::GeminiClient;

/// Output modality requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    Text,
    Image,
}

/// One model call
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub prompt: String,
    pub image: Option<ImageData>,
    pub modalities: Vec<Modality>,
    /// Overrides the client's configured model when set
    pub model: Option<String>,
}

impl ContentRequest {
    /// Image + text output for a photo edit.
    pub fn image_edit(prompt: impl Into<String>, source: &ImageData) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(source.clone()),
            modalities: vec![Modality::Image, Modality::Text],
            model: None,
        }
    }

    /// Text-only answer about a photo.
    pub fn describe(prompt: impl Into<String>, source: &ImageData) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(source.clone()),
            modalities: vec![Modality::Text],
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Part of a model response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    Text(String),
    Image(ImageData),
}

/// Model response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentResponse {
    pub parts: Vec<ResponsePart>,
}

impl ContentResponse {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ResponsePart::Text(text.into())],
        }
    }

    pub fn image(image: ImageData) -> Self {
        Self {
            parts: vec![ResponsePart::Image(image)],
        }
    }

    /// First inline image, if any.
    pub fn first_image(&self) -> Option<&ImageData> {
        self.parts.iter().find_map(|part| match part {
            ResponsePart::Image(image) => Some(image),
            ResponsePart::Text(_) => None,
        })
    }

    /// All text parts joined with newlines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ResponsePart::Text(text) => Some(text.as_str()),
                ResponsePart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Model provider client trait
#[async_trait]
pub trait ImageModelClient: Send + Sync {
    /// Issue one request; no retries at this layer
    async fn generate_content(&self, request: ContentRequest)
        -> Result<ContentResponse, ApiError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the generative language API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model used for image generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for classification (defaults to `model`)
    #[serde(default)]
    pub classifier_model: Option<String>,

    /// Inline API key; prefer `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            classifier_model: None,
            api_key: None,
            api_key_env: default_api_key_env(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(format!("Invalid endpoint URL: {}", self.endpoint));
        }
        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be positive".to_string());
        }
        Ok(())
    }

    /// Resolve the API key: inline value first, then the configured env var.
    pub fn resolve_api_key(&self) -> Result<String, ApiError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "No API key configured; set provider.api_key or the {} environment variable",
                    self.api_key_env
                ))
            })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builds provider clients from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(config: &ProviderConfig) -> Result<Arc<dyn ImageModelClient>, ApiError> {
        config.validate().map_err(ApiError::ConfigError)?;
        let api_key = config.resolve_api_key()?;
        Ok(Arc::new(GeminiClient::new(config, api_key)?))
    }
}
