//! Gemini `generateContent` client.

use crate::error::ApiError;
use crate::provider::{
    ContentRequest, ContentResponse, ImageModelClient, Modality, ProviderConfig, ResponsePart,
};
use crate::types::ImageData;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(
        default,
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn modality_name(modality: Modality) -> &'static str {
    match modality {
        Modality::Text => "TEXT",
        Modality::Image => "IMAGE",
    }
}

// Helper function to map HTTP errors to ApiError
fn map_http_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::ProviderRequestFailed {
            status: None,
            message: format!("Request timeout: {}", error),
        }
    } else if error.is_connect() {
        ApiError::ProviderRequestFailed {
            status: None,
            message: format!("Connection error: {}", error),
        }
    } else {
        ApiError::ProviderRequestFailed {
            status: error.status().map(|s| s.as_u16()),
            message: format!("HTTP error: {}", error),
        }
    }
}

fn map_status_error(status: u16, body: &str) -> ApiError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{} ({})", envelope.error.message, code),
            None => envelope.error.message,
        },
        Err(_) => body.to_string(),
    };
    match status {
        401 | 403 => ApiError::ProviderAuthFailed(message),
        _ => ApiError::ProviderRequestFailed {
            status: Some(status),
            message,
        },
    }
}

fn build_request_body(request: &ContentRequest) -> GenerateContentRequest {
    let mut parts = vec![Part {
        text: Some(request.prompt.clone()),
        inline_data: None,
    }];
    if let Some(image) = &request.image {
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            }),
        });
    }
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: GenerationConfig {
            response_modalities: request.modalities.iter().copied().map(modality_name).collect(),
        },
    }
}

fn parse_response(payload: GenerateContentResponse) -> Result<ContentResponse, ApiError> {
    let mut parts = Vec::new();
    for candidate in payload.candidates {
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            if let Some(inline) = part.inline_data {
                if inline.data.is_empty() {
                    continue;
                }
                let bytes = BASE64.decode(inline.data.as_bytes()).map_err(|e| {
                    ApiError::ProviderError(format!("Image payload is not valid base64: {}", e))
                })?;
                parts.push(ResponsePart::Image(ImageData::new(inline.mime_type, bytes)));
            } else if let Some(text) = part.text {
                parts.push(ResponsePart::Text(text));
            }
        }
    }
    Ok(ContentResponse { parts })
}

/// Gemini provider client
pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            api_key,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint_for(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ImageModelClient for GeminiClient {
    async fn generate_content(
        &self,
        request: ContentRequest,
    ) -> Result<ContentResponse, ApiError> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let url = self.endpoint_for(&model);
        let body = build_request_body(&request);

        debug!(model = %model, has_image = request.image.is_some(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_error(status, &error_text));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

        parse_response(payload)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
