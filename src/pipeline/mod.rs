// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod orchestrator;
mod progress;

pub use orchestrator::{BatchSync, SyncEntry, SyncSummary};
pub use progress::{ProgressTracker, SyncStats};
