// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns

//! Clone a git repository when its directory is missing, or fetch every remote
//! of the existing working copy, optionally across many repositories at once.

pub mod config;
pub mod error;
pub mod exporter;
pub mod pipeline;
pub mod repository;
pub mod utils;

pub use crate::config::{Config, RepositoryEntry, SyncConfig};
pub use error::{Result, SyncError};
pub use exporter::{JsonExporter, SyncReport};
pub use pipeline::{BatchSync, ProgressTracker, SyncEntry, SyncStats, SyncSummary};
pub use repository::{GitBackend, GitCli, RepositorySyncer, SyncOutcome, SyncRequest};
pub use utils::Validator;
