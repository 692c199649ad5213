//! Integration tests for classification, retries and the prompt fallback

use super::test_utils::{fast_config, source_photo, task, FakeModel};
use squadshot::classify::{Gender, GenderClassifier};
use squadshot::error::ApiError;
use squadshot::generation::prompt::{fallback_prompt, scene_prompt};
use squadshot::generation::ImageGenerator;
use squadshot::retry::RetryPolicy;
use squadshot::Studio;

#[tokio::test]
async fn test_studio_classifies_subject() {
    let model = FakeModel::new().answering(Some("Female.")).into_arc();
    let studio = Studio::with_client(model.clone(), &fast_config());
    assert_eq!(studio.classify(&source_photo()).await, Gender::Female);
}

#[tokio::test]
async fn test_classifier_never_errors() {
    let failing = FakeModel::new().answering(None).into_arc();
    let classifier = GenderClassifier::new(failing.clone(), RetryPolicy::immediate(3));
    assert_eq!(classifier.classify(&source_photo()).await, Gender::Unknown);
    // Auth failures are not retried.
    assert_eq!(failing.prompts().len(), 1);

    let vague = FakeModel::new().answering(Some("hard to say")).into_arc();
    let classifier = GenderClassifier::new(vague, RetryPolicy::immediate(3));
    assert_eq!(classifier.classify(&source_photo()).await, Gender::Unknown);
}

#[tokio::test]
async fn test_transient_failures_recover() {
    let model = FakeModel::new().failing_transiently(2).into_arc();
    let generator = ImageGenerator::new(model.clone(), RetryPolicy::immediate(3));
    let task = task("Night Stalker");

    let image = generator
        .generate_for_task(&source_photo(), &task)
        .await
        .unwrap();
    assert_eq!(image.mime_type, "image/png");

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts.iter().all(|p| *p == scene_prompt(&task)));
}

#[tokio::test]
async fn test_retries_exhausted_without_fallback() {
    let model = FakeModel::new().failing_transiently(5).into_arc();
    let generator = ImageGenerator::new(model.clone(), RetryPolicy::immediate(3));

    let err = generator
        .generate_for_task(&source_photo(), &task("Night Stalker"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::ProviderRequestFailed {
            status: Some(503),
            ..
        }
    ));
    assert_eq!(model.prompts().len(), 3);
}

#[tokio::test]
async fn test_fallback_attempted_exactly_once() {
    let model = FakeModel::new().refusing("Crimson Sniper").into_arc();
    let generator = ImageGenerator::new(model.clone(), RetryPolicy::immediate(3));
    let task = task("Crimson Sniper");

    let err = generator
        .generate_for_task(&source_photo(), &task)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::GenerationFailed(_)));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], scene_prompt(&task));
    assert_eq!(prompts[1], fallback_prompt("Crimson Sniper"));
}
