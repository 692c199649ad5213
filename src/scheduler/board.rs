//! In-memory status map keyed by subject label.
//!
//! The board is the canonical view of a batch: the regeneration guard reads
//! it, and album assembly filters it down to finished images. Labels keep the
//! order in which they were first published.

use crate::scheduler::observer::{GenerationStatus, StatusEvent, StatusObserver};
use crate::types::ImageData;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct StatusBoard {
    statuses: RwLock<IndexMap<String, GenerationStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<GenerationStatus> {
        self.statuses.read().get(label).cloned()
    }

    pub fn is_pending(&self, label: &str) -> bool {
        self.statuses
            .read()
            .get(label)
            .map(GenerationStatus::is_pending)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.statuses.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.read().is_empty()
    }

    /// Copy of every label and status, in publication order.
    pub fn snapshot(&self) -> Vec<(String, GenerationStatus)> {
        self.statuses
            .read()
            .iter()
            .map(|(label, status)| (label.clone(), status.clone()))
            .collect()
    }

    /// True once every listed label has a terminal status.
    pub fn all_terminal<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> bool {
        let statuses = self.statuses.read();
        labels.into_iter().all(|label| {
            statuses
                .get(label)
                .map(GenerationStatus::is_terminal)
                .unwrap_or(false)
        })
    }

    /// Finished images, in publication order.
    pub fn done_images(&self) -> IndexMap<String, ImageData> {
        self.statuses
            .read()
            .iter()
            .filter_map(|(label, status)| match status {
                GenerationStatus::Done(image) => Some((label.clone(), image.clone())),
                _ => None,
            })
            .collect()
    }

    /// Mark `label` pending unless it already is. Returns whether the caller
    /// now owns the in-flight generation for that label.
    pub fn try_begin(&self, label: &str, token: &CancellationToken) -> bool {
        let mut statuses = self.statuses.write();
        if token.is_cancelled() {
            return false;
        }
        if statuses.get(label).map(GenerationStatus::is_pending).unwrap_or(false) {
            return false;
        }
        statuses.insert(label.to_string(), GenerationStatus::Pending);
        true
    }

    /// Record an event unless its batch was cancelled. Checked under the write
    /// lock so a concurrent reset cannot be overwritten by a late result.
    pub fn record_unless_cancelled(&self, event: &StatusEvent, token: &CancellationToken) -> bool {
        let mut statuses = self.statuses.write();
        if token.is_cancelled() {
            return false;
        }
        statuses.insert(event.label.clone(), event.status.clone());
        true
    }

    pub fn clear(&self) {
        self.statuses.write().clear();
    }
}

impl StatusObserver for StatusBoard {
    fn on_status(&self, event: &StatusEvent) {
        self.statuses
            .write()
            .insert(event.label.clone(), event.status.clone());
    }
}
