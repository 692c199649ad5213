//! Generation Scheduler
//!
//! Bounded worker pool that drains a FIFO queue of generation tasks. Each
//! worker takes one task at a time and runs it to completion before taking the
//! next, so at most `concurrency` tasks are in flight. A failing task only
//! affects its own label; the batch completes once the queue is empty and every
//! in-flight task has resolved.

pub mod board;
pub mod observer;

pub use board::StatusBoard;
pub use observer::{
    ChannelObserver, GenerationStatus, LoggingObserver, StatusEvent, StatusEventData,
    StatusObserver,
};

use crate::error::ApiError;
use crate::generation::GenerationTask;
use crate::retry::RetryPolicy;
use crate::types::ImageData;
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::{Mutex as SyncMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs one task to completion
#[async_trait]
pub trait TaskPerformer: Send + Sync {
    async fn perform(&self, task: &GenerationTask) -> Result<ImageData, ApiError>;
}

/// Configuration for batch generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Tasks drawn per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Attempts per remote call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Backoff base delay (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum random jitter added to each backoff (milliseconds)
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

fn default_concurrency() -> usize {
    2
}

fn default_batch_size() -> usize {
    4
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_jitter_ms() -> u64 {
    1000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("Concurrency must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return Err("Batch size must be at least 1".to_string());
        }
        if self.max_attempts == 0 {
            return Err("Max attempts must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_jitter_ms),
        )
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of queued tasks
    pub pending: usize,
    /// Number of tasks currently being processed
    pub processing: usize,
    /// Number of completed tasks
    pub completed: usize,
    /// Number of failed tasks
    pub failed: usize,
}

/// State shared between the scheduler handle and its workers
struct SchedulerShared {
    board: Arc<StatusBoard>,
    observers: Vec<Arc<dyn StatusObserver>>,
    stats: RwLock<QueueStats>,
}

impl SchedulerShared {
    fn publish(&self, event: StatusEvent, token: &CancellationToken) {
        if !self.board.record_unless_cancelled(&event, token) {
            debug!(label = %event.label, status = event.status.name(), "Dropping status for cancelled batch");
            return;
        }
        self.notify(&event);
    }

    /// Apply `update` to the stats unless `token`'s batch was cancelled.
    ///
    /// `reset` cancels before clearing the stats, so checking under the lock
    /// keeps a cancelled batch from touching its successor's counts.
    fn update_stats(&self, token: &CancellationToken, update: impl FnOnce(&mut QueueStats)) -> bool {
        let mut stats = self.stats.write();
        if token.is_cancelled() {
            return false;
        }
        update(&mut stats);
        true
    }

    fn notify(&self, event: &StatusEvent) {
        for observer in &self.observers {
            observer.on_status(event);
        }
    }
}

pub struct GenerationScheduler {
    shared: Arc<SchedulerShared>,
    cancel: SyncMutex<CancellationToken>,
}

impl Default for GenerationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationScheduler {
    pub fn new() -> Self {
        Self::with_observers(Arc::new(StatusBoard::new()), Vec::new())
    }

    /// Scheduler publishing into `board` and then into every observer.
    pub fn with_observers(board: Arc<StatusBoard>, observers: Vec<Arc<dyn StatusObserver>>) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                board,
                observers,
                stats: RwLock::new(QueueStats::default()),
            }),
            cancel: SyncMutex::new(CancellationToken::new()),
        }
    }

    pub fn board(&self) -> &Arc<StatusBoard> {
        &self.shared.board
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        self.shared.stats.read().clone()
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// Run a batch with `concurrency` workers. Returns once every task has a
    /// terminal status (or the batch was reset).
    pub async fn run(
        &self,
        tasks: Vec<GenerationTask>,
        concurrency: usize,
        performer: Arc<dyn TaskPerformer>,
    ) {
        let token = self.current_token();
        let task_count = tasks.len();
        if task_count == 0 {
            debug!("No tasks to schedule");
            return;
        }

        for task in &tasks {
            self.shared.publish(
                StatusEvent::new(task.subject_label.clone(), GenerationStatus::Pending),
                &token,
            );
        }
        self.shared.update_stats(&token, |stats| stats.pending += task_count);

        let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let worker_count = concurrency.max(1).min(task_count);
        let start = Instant::now();

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = Arc::clone(&queue);
            let shared = Arc::clone(&self.shared);
            let performer = Arc::clone(&performer);
            let token = token.clone();
            workers.push(tokio::spawn(async move {
                Self::worker_loop(worker_id, queue, shared, performer, token).await;
            }));
        }

        info!(
            worker_count,
            task_count, "Started generation workers"
        );

        for result in join_all(workers).await {
            if let Err(e) = result {
                error!(error = %e, "Generation worker terminated abnormally");
            }
        }

        let stats = self.stats();
        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            completed = stats.completed,
            failed = stats.failed,
            cancelled = token.is_cancelled(),
            "Generation batch finished"
        );
    }

    /// Run a single task outside the pool. No-op (returns `false`) while the
    /// label already has a generation in flight.
    pub async fn regenerate(&self, task: GenerationTask, performer: Arc<dyn TaskPerformer>) -> bool {
        let token = self.current_token();
        let label = task.subject_label.clone();
        if !self.shared.board.try_begin(&label, &token) {
            debug!(label = %label, "Regeneration skipped, label already pending");
            return false;
        }
        self.shared
            .notify(&StatusEvent::new(label.clone(), GenerationStatus::Pending));

        info!(label = %label, "Regenerating single task");
        self.shared.update_stats(&token, |stats| stats.processing += 1);
        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            result = performer.perform(&task) => Some(result),
        };
        Self::finish_task(&self.shared, &token, &label, outcome);
        true
    }

    /// Cancel the current batch and forget all status.
    ///
    /// In-flight tasks are dropped at their next suspension point and publish
    /// nothing further.
    pub fn reset(&self) {
        let mut cancel = self.cancel.lock();
        cancel.cancel();
        *cancel = CancellationToken::new();
        drop(cancel);

        self.shared.board.clear();
        *self.shared.stats.write() = QueueStats::default();
        info!("Scheduler reset, in-flight generations cancelled");
    }

    /// Worker loop for processing tasks
    async fn worker_loop(
        worker_id: usize,
        queue: Arc<Mutex<VecDeque<GenerationTask>>>,
        shared: Arc<SchedulerShared>,
        performer: Arc<dyn TaskPerformer>,
        token: CancellationToken,
    ) {
        debug!(worker_id, "Worker started");

        while !token.is_cancelled() {
            let task = {
                let mut queue_guard = queue.lock().await;
                queue_guard.pop_front()
            };
            let Some(task) = task else {
                break;
            };

            let started = shared.update_stats(&token, |stats| {
                stats.pending = stats.pending.saturating_sub(1);
                stats.processing += 1;
            });
            if !started {
                break;
            }
            debug!(worker_id, label = %task.subject_label, "Processing generation task");

            let start = Instant::now();
            let outcome = tokio::select! {
                _ = token.cancelled() => None,
                result = performer.perform(&task) => Some(result),
            };
            debug!(
                worker_id,
                label = %task.subject_label,
                duration_ms = start.elapsed().as_millis() as u64,
                "Generation task resolved"
            );
            Self::finish_task(&shared, &token, &task.subject_label, outcome);
        }

        debug!(worker_id, "Worker stopped");
    }

    fn finish_task(
        shared: &SchedulerShared,
        token: &CancellationToken,
        label: &str,
        outcome: Option<Result<ImageData, ApiError>>,
    ) {
        let Some(result) = outcome else {
            return;
        };
        let succeeded = result.is_ok();
        let counted = shared.update_stats(token, |stats| {
            stats.processing = stats.processing.saturating_sub(1);
            if succeeded {
                stats.completed += 1;
            } else {
                stats.failed += 1;
            }
        });
        if !counted {
            debug!(label = %label, "Ignoring result of cancelled batch");
            return;
        }

        let status = match result {
            Ok(image) => GenerationStatus::Done(image),
            Err(e) => {
                error!(label = %label, error = %e, "Generation task failed");
                GenerationStatus::Error(e.to_string())
            }
        };
        shared.publish(StatusEvent::new(label, status), token);
    }
}
