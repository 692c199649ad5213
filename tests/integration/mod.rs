//! Integration tests for the squadshot pipeline

mod album_composition;
mod cli_compose;
mod config_loading;
mod generation_pipeline;
mod scheduler_batches;
mod test_utils;
