//! Shared test utilities for integration tests
//!
//! `FakeModel` stands in for the remote model: it answers classification
//! requests with fixed text, renders solid-color PNGs for image requests, and
//! can refuse labels, fail transiently, hold requests behind a gate, and
//! track how many requests are in flight.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use squadshot::config::SquadshotConfig;
use squadshot::error::ApiError;
use squadshot::generation::GenerationTask;
use squadshot::provider::{ContentRequest, ContentResponse, ImageModelClient, Modality};
use squadshot::types::ImageData;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Encode a solid-color PNG
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> ImageData {
    let image = RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    ImageData::new("image/png", bytes)
}

/// Stable color for a label, far from the page background
pub fn label_color(label: &str) -> [u8; 3] {
    let sum: u32 = label.bytes().map(u32::from).sum();
    match sum % 3 {
        0 => [200, 30, 30],
        1 => [30, 160, 40],
        _ => [30, 50, 200],
    }
}

pub fn source_photo() -> ImageData {
    solid_png(8, 8, [120, 110, 100])
}

pub fn task(label: &str) -> GenerationTask {
    GenerationTask::new(label, "tactical gear", "Erangel", "looting a crate")
}

/// Config with instant retries and a small album page
pub fn fast_config() -> SquadshotConfig {
    let mut config = SquadshotConfig::default();
    config.generation.base_delay_ms = 0;
    config.generation.max_jitter_ms = 0;
    config.album.width = 600;
    config.album.height = 840;
    config.album.header_height = 100;
    config.album.padding = 20;
    config
}

pub struct FakeModel {
    gender_answer: Option<String>,
    refused: HashSet<String>,
    transient_failures: AtomicUsize,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self {
            gender_answer: Some("female".to_string()),
            refused: HashSet::new(),
            transient_failures: AtomicUsize::new(0),
            delay: Duration::ZERO,
            gate: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Classification answer; `None` makes classification requests fail.
    pub fn answering(mut self, answer: Option<&str>) -> Self {
        self.gender_answer = answer.map(str::to_string);
        self
    }

    /// Every prompt mentioning `label` comes back without an image.
    pub fn refusing(mut self, label: &str) -> Self {
        self.refused.insert(label.to_string());
        self
    }

    /// The next `count` image requests fail with a 503.
    pub fn failing_transiently(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Image requests wait for a permit from `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn prompts_mentioning(&self, label: &str) -> usize {
        self.prompts.lock().iter().filter(|p| p.contains(label)).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn render(&self, prompt: &str) -> Result<ContentResponse, ApiError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let transient = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if transient {
            return Err(ApiError::ProviderRequestFailed {
                status: Some(503),
                message: "Service Unavailable".to_string(),
            });
        }

        if let Some(label) = self.refused.iter().find(|label| prompt.contains(label.as_str())) {
            return Ok(ContentResponse::text_only(format!(
                "I can't create an image of {}",
                label
            )));
        }

        let label = squadshot::generation::prompt::extract_outfit_label(prompt).unwrap_or(prompt);
        Ok(ContentResponse::image(solid_png(48, 64, label_color(label))))
    }
}

#[async_trait]
impl ImageModelClient for FakeModel {
    async fn generate_content(&self, request: ContentRequest) -> Result<ContentResponse, ApiError> {
        self.prompts.lock().push(request.prompt.clone());
        if !request.modalities.contains(&Modality::Image) {
            return match &self.gender_answer {
                Some(answer) => Ok(ContentResponse::text_only(answer.clone())),
                None => Err(ApiError::ProviderAuthFailed("invalid key".to_string())),
            };
        }
        self.render(&request.prompt).await
    }

    fn provider_name(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-image-model"
    }
}
