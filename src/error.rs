// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Exit status git uses for "repository not found" and "access denied".
pub const GIT_FATAL_STATUS: i32 = 128;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Clone of {url} into {} failed (status {}): {stderr}", path.display(), display_status(*status))]
    Clone {
        url: String,
        path: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Cannot open {} as a git working copy (status {}): {stderr}", path.display(), display_status(*status))]
    Open {
        path: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Fetch of remote {remote} in {} failed (status {}): {stderr}", path.display(), display_status(*status))]
    Fetch {
        path: PathBuf,
        remote: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Failed to run {program}: {source}")]
    GitUnavailable {
        program: String,
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Status code of the git process behind this error, if any.
    pub fn status(&self) -> Option<i32> {
        match self {
            SyncError::Clone { status, .. }
            | SyncError::Open { status, .. }
            | SyncError::Fetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Clone failures git reports with status 128 are skipped rather than fatal.
    pub fn is_skippable_clone(&self) -> bool {
        matches!(
            self,
            SyncError::Clone {
                status: Some(GIT_FATAL_STATUS),
                ..
            }
        )
    }
}

fn display_status(status: Option<i32>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "killed by signal".to_string(),
    }
}
