// file: src/repository/mod.rs
// description: Repository operations module exports
// reference: Internal module structure

pub mod git;
pub mod syncer;

pub use git::{GitBackend, GitCli};
pub use syncer::{RepositorySyncer, SyncOutcome, SyncRequest};
