//! Integration tests for batch scheduling through the studio
//!
//! Tests cover:
//! - Concurrency bound
//! - Failure isolation between labels
//! - Regeneration guard while a label is pending
//! - Reset of an in-flight batch

use super::test_utils::{fast_config, source_photo, task, FakeModel};
use squadshot::scheduler::{ChannelObserver, GenerationStatus, StatusObserver};
use squadshot::Studio;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

const LABELS: [&str; 4] = ["Ghillie Ghost", "Desert Ranger", "Broken Arrow", "Night Stalker"];

async fn wait_for_prompts(model: &FakeModel, count: usize) {
    for _ in 0..500 {
        if model.prompts().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("model never saw {} prompts", count);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_bound_and_failure_isolation() {
    let model = FakeModel::new()
        .refusing("Broken Arrow")
        .with_delay(Duration::from_millis(30))
        .into_arc();
    let studio = Studio::with_client(model.clone(), &fast_config());

    let tasks = LABELS.iter().map(|label| task(label)).collect();
    studio.run_batch(&source_photo(), tasks, Some(2)).await;

    assert_eq!(model.max_in_flight(), 2);
    for label in LABELS {
        let status = studio.status(label).expect("status recorded");
        if label == "Broken Arrow" {
            assert!(matches!(status, GenerationStatus::Error(_)), "{label}");
        } else {
            assert!(matches!(status, GenerationStatus::Done(_)), "{label}");
        }
    }

    let stats = studio.scheduler().stats();
    assert_eq!(stats.completed, 3);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.processing, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_configured_concurrency_used_by_default() {
    let model = FakeModel::new()
        .with_delay(Duration::from_millis(20))
        .into_arc();
    let mut config = fast_config();
    config.generation.concurrency = 1;
    let studio = Studio::with_client(model.clone(), &config);

    let tasks = LABELS.iter().map(|label| task(label)).collect();
    studio.run_batch(&source_photo(), tasks, None).await;

    assert_eq!(model.max_in_flight(), 1);
    assert_eq!(studio.board().done_images().len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_observers_see_every_transition() {
    let model = FakeModel::new().refusing("Broken Arrow").into_arc();
    let (observer, mut events) = ChannelObserver::new();
    let observers: Vec<Arc<dyn StatusObserver>> = vec![Arc::new(observer)];
    let studio = Studio::with_observers(model, &fast_config(), observers);

    let tasks = vec![task("Ghillie Ghost"), task("Broken Arrow")];
    studio.run_batch(&source_photo(), tasks, Some(2)).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push((event.label, event.status.name()));
    }
    assert_eq!(seen.len(), 4);
    assert!(seen.contains(&("Ghillie Ghost".to_string(), "pending")));
    assert!(seen.contains(&("Ghillie Ghost".to_string(), "done")));
    assert!(seen.contains(&("Broken Arrow".to_string(), "error")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_regeneration_is_noop_while_pending() {
    let gate = Arc::new(Semaphore::new(0));
    let model = FakeModel::new().gated(Arc::clone(&gate)).into_arc();
    let studio = Studio::with_client(model.clone(), &fast_config());
    let photo = source_photo();

    let tasks = vec![task("Ghillie Ghost"), task("Desert Ranger")];
    tokio::join!(studio.run_batch(&photo, tasks, Some(2)), async {
        wait_for_prompts(&model, 2).await;
        assert!(studio.status("Ghillie Ghost").unwrap().is_pending());

        let started = studio.regenerate_one(&photo, task("Ghillie Ghost")).await;
        assert!(!started);
        assert_eq!(model.prompts_mentioning("Ghillie Ghost"), 1);

        gate.add_permits(16);
    });

    assert!(matches!(
        studio.status("Ghillie Ghost"),
        Some(GenerationStatus::Done(_))
    ));

    // Once terminal, the label can be regenerated.
    assert!(studio.regenerate_one(&photo, task("Ghillie Ghost")).await);
    assert_eq!(model.prompts_mentioning("Ghillie Ghost"), 2);
    assert!(matches!(
        studio.status("Ghillie Ghost"),
        Some(GenerationStatus::Done(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reset_cancels_in_flight_batch() {
    let gate = Arc::new(Semaphore::new(0));
    let model = FakeModel::new().gated(Arc::clone(&gate)).into_arc();
    let studio = Studio::with_client(model.clone(), &fast_config());
    let photo = source_photo();

    let tasks = LABELS.iter().map(|label| task(label)).collect();
    tokio::join!(studio.run_batch(&photo, tasks, Some(2)), async {
        wait_for_prompts(&model, 2).await;
        studio.reset();
        gate.add_permits(16);
    });

    assert!(studio.board().is_empty());
    // Queued tasks were never started.
    assert_eq!(model.prompts().len(), 2);
}
