//! Image generation against the remote model.
//!
//! [`ImageGenerator`] issues a prompt with the source photo attached, retries
//! transient transport failures, and falls back to a shorter prompt once when
//! the primary prompt comes back without an image.

pub mod prompt;
pub mod task;

pub use task::{GenerationTask, SceneParameters};

use crate::error::ApiError;
use crate::provider::{ContentRequest, ImageModelClient};
use crate::retry::RetryPolicy;
use crate::scheduler::TaskPerformer;
use crate::types::ImageData;
use async_trait::async_trait;
use prompt::{extract_outfit_label, fallback_prompt, scene_prompt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const REJECTION_TEXT_LIMIT: usize = 200;

pub struct ImageGenerator {
    client: Arc<dyn ImageModelClient>,
    retry: RetryPolicy,
}

impl ImageGenerator {
    pub fn new(client: Arc<dyn ImageModelClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Generate an image for `prompt`, applying the fallback prompt once if the
    /// primary prompt is rejected.
    pub async fn generate(&self, source: &ImageData, prompt: &str) -> Result<ImageData, ApiError> {
        let start = Instant::now();
        let rejection = match self.request_image(source, prompt).await {
            Ok(image) => {
                debug!(duration_ms = start.elapsed().as_millis() as u64, "Primary prompt produced an image");
                return Ok(image);
            }
            Err(ApiError::ContentRejected(reason)) => reason,
            Err(err) => return Err(err),
        };

        let Some(label) = extract_outfit_label(prompt) else {
            warn!("Prompt rejected and no outfit label could be recovered for a fallback");
            return Err(ApiError::ContentRejected(rejection));
        };

        info!(label = %label, "Primary prompt rejected, retrying with fallback prompt");
        let fallback = fallback_prompt(label);
        match self.request_image(source, &fallback).await {
            Ok(image) => {
                info!(
                    label = %label,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Fallback prompt produced an image"
                );
                Ok(image)
            }
            Err(err) => Err(ApiError::GenerationFailed(format!(
                "primary prompt rejected: {}; fallback prompt failed: {}",
                rejection, err
            ))),
        }
    }

    /// Generate the themed portrait for a task.
    pub async fn generate_for_task(
        &self,
        source: &ImageData,
        task: &GenerationTask,
    ) -> Result<ImageData, ApiError> {
        self.generate(source, &scene_prompt(task)).await
    }

    /// One prompt under the retry policy; a text-only answer is a rejection.
    async fn request_image(&self, source: &ImageData, prompt: &str) -> Result<ImageData, ApiError> {
        let response = self
            .retry
            .run("generate_image", move |attempt| {
                debug!(attempt, model = %self.client.model_name(), "Requesting image");
                let request = ContentRequest::image_edit(prompt, source);
                self.client.generate_content(request)
            })
            .await?;

        match response.first_image() {
            Some(image) => Ok(image.clone()),
            None => {
                let text = response.text();
                let reason = if text.trim().is_empty() {
                    "model returned no image".to_string()
                } else {
                    format!(
                        "model returned text instead of an image: {}",
                        truncate_text(text.trim(), REJECTION_TEXT_LIMIT)
                    )
                };
                Err(ApiError::ContentRejected(reason))
            }
        }
    }
}

/// Production performer: renders each task from the same source photo.
pub struct PortraitPerformer {
    generator: Arc<ImageGenerator>,
    source: ImageData,
}

impl PortraitPerformer {
    pub fn new(generator: Arc<ImageGenerator>, source: ImageData) -> Self {
        Self { generator, source }
    }
}

#[async_trait]
impl TaskPerformer for PortraitPerformer {
    async fn perform(&self, task: &GenerationTask) -> Result<ImageData, ApiError> {
        self.generator.generate_for_task(&self.source, task).await
    }
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
