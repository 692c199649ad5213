//! Squadshot: themed squad portraits from a single photo
//!
//! Classifies the subject of a photo, renders a batch of themed portraits
//! through a remote image model with bounded concurrency, retries and a
//! prompt fallback, and lays finished portraits out on an album page.

pub mod album;
pub mod artifact;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod provider;
pub mod retry;
pub mod scheduler;
pub mod studio;
pub mod theme;
pub mod types;

pub use error::ApiError;
pub use studio::Studio;
