//! Status events and observers.

use crate::types::ImageData;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Per-label generation state
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationStatus {
    Pending,
    Done(ImageData),
    Error(String),
}

impl GenerationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, GenerationStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    pub fn name(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Done(_) => "done",
            GenerationStatus::Error(_) => "error",
        }
    }
}

/// One status transition
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub label: String,
    pub status: GenerationStatus,
}

impl StatusEvent {
    pub fn new(label: impl Into<String>, status: GenerationStatus) -> Self {
        Self {
            label: label.into(),
            status,
        }
    }
}

/// Serializable summary of an event, without image bytes
#[derive(Debug, Clone, Serialize)]
pub struct StatusEventData {
    pub label: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_bytes: Option<usize>,
}

impl From<&StatusEvent> for StatusEventData {
    fn from(event: &StatusEvent) -> Self {
        let (error, image_bytes) = match &event.status {
            GenerationStatus::Pending => (None, None),
            GenerationStatus::Done(image) => (None, Some(image.bytes.len())),
            GenerationStatus::Error(message) => (Some(message.clone()), None),
        };
        Self {
            label: event.label.clone(),
            status: event.status.name(),
            error,
            image_bytes,
        }
    }
}

/// Receives every status transition published by the scheduler
pub trait StatusObserver: Send + Sync {
    fn on_status(&self, event: &StatusEvent);
}

/// Logs transitions through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl StatusObserver for LoggingObserver {
    fn on_status(&self, event: &StatusEvent) {
        match &event.status {
            GenerationStatus::Pending => info!(label = %event.label, "Generation pending"),
            GenerationStatus::Done(image) => info!(
                label = %event.label,
                mime_type = %image.mime_type,
                bytes = image.bytes.len(),
                "Generation done"
            ),
            GenerationStatus::Error(message) => {
                warn!(label = %event.label, error = %message, "Generation failed")
            }
        }
    }
}

/// Streams transitions into a channel
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusObserver for ChannelObserver {
    fn on_status(&self, event: &StatusEvent) {
        // Receiver gone means nobody is listening anymore.
        let _ = self.tx.send(event.clone());
    }
}
