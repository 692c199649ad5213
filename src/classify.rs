//! Gender classification of the source photo.
//!
//! Classification never blocks the pipeline: transport failures (after the
//! usual retry policy) and ambiguous answers both resolve to
//! [`Gender::Unknown`].

use crate::provider::{ContentRequest, ImageModelClient};
use crate::retry::RetryPolicy;
use crate::types::ImageData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Instruction sent alongside the photo.
pub const CLASSIFY_INSTRUCTION: &str = "Look at the person in this photo and answer with a single \
     word: \"male\" or \"female\". If you cannot tell, answer \"unknown\".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl Gender {
    /// Normalize free-form model text.
    ///
    /// "female" contains "male", so it is checked first.
    pub fn from_response_text(text: &str) -> Self {
        let lowered = text.to_lowercase();
        if lowered.contains("female") {
            Gender::Female
        } else if lowered.contains("male") {
            Gender::Male
        } else {
            Gender::Unknown
        }
    }
}

pub struct GenderClassifier {
    client: Arc<dyn ImageModelClient>,
    retry: RetryPolicy,
    model: Option<String>,
}

impl GenderClassifier {
    pub fn new(client: Arc<dyn ImageModelClient>, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            model: None,
        }
    }

    /// Use a different model than the client's default for classification.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub async fn classify(&self, source: &ImageData) -> Gender {
        let response = self
            .retry
            .run("classify_gender", move |_| {
                let request = ContentRequest::describe(CLASSIFY_INSTRUCTION, source)
                    .with_model(self.model.clone());
                self.client.generate_content(request)
            })
            .await;

        match response {
            Ok(response) => {
                let gender = Gender::from_response_text(&response.text());
                info!(gender = %gender, "Classified source photo");
                gender
            }
            Err(err) => {
                warn!(error = %err, "Classification failed, defaulting to unknown");
                Gender::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::provider::ContentResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClient {
        answer: Result<ContentResponse, ApiError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageModelClient for FixedClient {
        async fn generate_content(
            &self,
            _request: ContentRequest,
        ) -> Result<ContentResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn classifier(answer: Result<ContentResponse, ApiError>) -> (GenderClassifier, Arc<FixedClient>) {
        let client = Arc::new(FixedClient {
            answer,
            calls: AtomicUsize::new(0),
        });
        (
            GenderClassifier::new(client.clone(), RetryPolicy::immediate(3)),
            client,
        )
    }

    #[test]
    fn test_response_normalization() {
        assert_eq!(Gender::from_response_text("Male"), Gender::Male);
        assert_eq!(Gender::from_response_text("  FEMALE.\n"), Gender::Female);
        assert_eq!(Gender::from_response_text("The person appears female"), Gender::Female);
        assert_eq!(Gender::from_response_text("unknown"), Gender::Unknown);
        assert_eq!(Gender::from_response_text(""), Gender::Unknown);
        assert_eq!(Gender::from_response_text("¯\\_(ツ)_/¯"), Gender::Unknown);
    }

    #[tokio::test]
    async fn test_classify_success() {
        let (classifier, _) = classifier(Ok(ContentResponse::text_only("female")));
        let photo = ImageData::new("image/png", vec![0]);
        assert_eq!(classifier.classify(&photo).await, Gender::Female);
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_unknown() {
        let (classifier, client) = classifier(Err(ApiError::ProviderRequestFailed {
            status: Some(500),
            message: "internal".to_string(),
        }));
        let photo = ImageData::new("image/png", vec![0]);
        assert_eq!(classifier.classify(&photo).await, Gender::Unknown);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retriable_failure_maps_to_unknown() {
        let (classifier, client) =
            classifier(Err(ApiError::ProviderAuthFailed("denied".to_string())));
        let photo = ImageData::new("image/png", vec![0]);
        assert_eq!(classifier.classify(&photo).await, Gender::Unknown);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Gender::Male.to_string(), "male");
        assert_eq!(Gender::Unknown.to_string(), "unknown");
    }
}
