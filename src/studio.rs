//! Studio: the pipeline facade.
//!
//! Wires the classifier, generator, scheduler and compositor from one config
//! and one model client. A studio holds one batch at a time; `reset` drops it.

use crate::album::{AlbumCompositor, AlbumImageSet, EncodedImage};
use crate::classify::{Gender, GenderClassifier};
use crate::config::SquadshotConfig;
use crate::error::ApiError;
use crate::generation::{GenerationTask, ImageGenerator, PortraitPerformer};
use crate::provider::{ImageModelClient, ProviderFactory};
use crate::scheduler::{
    GenerationConfig, GenerationScheduler, GenerationStatus, LoggingObserver, StatusBoard,
    StatusObserver,
};
use crate::types::ImageData;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Studio {
    classifier: GenderClassifier,
    generator: Arc<ImageGenerator>,
    scheduler: GenerationScheduler,
    compositor: AlbumCompositor,
    generation: GenerationConfig,
}

impl Studio {
    /// Build a studio talking to the configured provider.
    pub fn from_config(config: &SquadshotConfig) -> Result<Self, ApiError> {
        let client = ProviderFactory::create_client(&config.provider)?;
        Ok(Self::with_client(client, config))
    }

    /// Build a studio around an existing client, logging status transitions.
    pub fn with_client(client: Arc<dyn ImageModelClient>, config: &SquadshotConfig) -> Self {
        Self::with_observers(client, config, vec![Arc::new(LoggingObserver)])
    }

    /// Build a studio with extra status observers. The status board is always
    /// attached.
    pub fn with_observers(
        client: Arc<dyn ImageModelClient>,
        config: &SquadshotConfig,
        observers: Vec<Arc<dyn StatusObserver>>,
    ) -> Self {
        let retry = config.generation.retry_policy();
        let classifier = GenderClassifier::new(Arc::clone(&client), retry.clone())
            .with_model(config.provider.classifier_model.clone());
        let generator = Arc::new(ImageGenerator::new(client, retry));
        let scheduler = GenerationScheduler::with_observers(Arc::new(StatusBoard::new()), observers);
        let compositor = AlbumCompositor::new(config.album.clone());

        Self {
            classifier,
            generator,
            scheduler,
            compositor,
            generation: config.generation.clone(),
        }
    }

    /// Replace the compositor, e.g. one without text rendering.
    pub fn with_compositor(mut self, compositor: AlbumCompositor) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn board(&self) -> &Arc<StatusBoard> {
        self.scheduler.board()
    }

    pub fn scheduler(&self) -> &GenerationScheduler {
        &self.scheduler
    }

    pub fn status(&self, label: &str) -> Option<GenerationStatus> {
        self.board().get(label)
    }

    pub async fn classify(&self, photo: &ImageData) -> Gender {
        self.classifier.classify(photo).await
    }

    /// Generate every task from `photo`. Uses the configured concurrency when
    /// `concurrency` is `None`.
    pub async fn run_batch(
        &self,
        photo: &ImageData,
        tasks: Vec<GenerationTask>,
        concurrency: Option<usize>,
    ) {
        let concurrency = concurrency.unwrap_or(self.generation.concurrency);
        let performer = Arc::new(PortraitPerformer::new(
            Arc::clone(&self.generator),
            photo.clone(),
        ));
        self.scheduler.run(tasks, concurrency, performer).await;
    }

    /// Regenerate one label. Returns `false` when it is already in flight.
    pub async fn regenerate_one(&self, photo: &ImageData, task: GenerationTask) -> bool {
        let performer = Arc::new(PortraitPerformer::new(
            Arc::clone(&self.generator),
            photo.clone(),
        ));
        self.scheduler.regenerate(task, performer).await
    }

    /// Compose the album from the finished images of `expected_labels`.
    ///
    /// Every expected label must be done; otherwise nothing is composed and
    /// the missing labels are reported.
    pub fn compose_album<'a>(
        &self,
        expected_labels: impl IntoIterator<Item = &'a str>,
    ) -> Result<EncodedImage, ApiError> {
        self.compose_album_with_rng(expected_labels, &mut rand::rng())
    }

    pub fn compose_album_with_rng<'a, R: Rng>(
        &self,
        expected_labels: impl IntoIterator<Item = &'a str>,
        rng: &mut R,
    ) -> Result<EncodedImage, ApiError> {
        let expected: Vec<&str> = expected_labels.into_iter().collect();
        let done = self.board().done_images();

        let missing: Vec<String> = expected
            .iter()
            .filter(|label| !done.contains_key(**label))
            .map(|label| label.to_string())
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Album requested before every portrait finished");
            return Err(ApiError::AlbumIncomplete(missing));
        }

        let selected: Vec<(&String, &ImageData)> = expected
            .iter()
            .filter_map(|label| done.get_key_value(*label))
            .collect();
        let images = AlbumImageSet::decode(selected)?;
        info!(cards = images.len(), "Composing album");
        self.compositor.compose_with_rng(&images, rng)
    }

    /// Cancel in-flight work and forget all status.
    pub fn reset(&self) {
        self.scheduler.reset();
    }
}
