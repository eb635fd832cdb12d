// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{Result, SyncError};
use crate::repository::SyncRequest;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

pub struct Validator;

impl Validator {
    /// Accepts the remote forms git understands: URLs with a scheme, scp-like
    /// `user@host:path` and local paths.
    pub fn validate_remote_url(url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SyncError::Validation("Remote URL is empty".to_string()));
        }

        if url.chars().any(char::is_whitespace) {
            return Err(SyncError::Validation(format!(
                "Remote URL contains whitespace: {}",
                url
            )));
        }

        if url.starts_with('-') {
            return Err(SyncError::Validation(format!(
                "Remote URL must not start with '-': {}",
                url
            )));
        }

        if let Some((scheme, rest)) = url.split_once("://") {
            let known = ["http", "https", "ssh", "git", "file", "ftp", "ftps"];
            if !known.contains(&scheme) && !scheme.starts_with("git+") {
                return Err(SyncError::Validation(format!(
                    "Unsupported URL scheme '{}': {}",
                    scheme, url
                )));
            }
            if rest.is_empty() {
                return Err(SyncError::Validation(format!(
                    "URL has no location: {}",
                    url
                )));
            }
        }

        Ok(())
    }

    /// Directory name git would pick for `url`: the last path segment with
    /// any `.git` suffix removed.
    pub fn directory_name_for(url: &str) -> Result<String> {
        let trimmed = url.trim().trim_end_matches('/');
        let segment = trimmed
            .rsplit(['/', ':', '\\'])
            .next()
            .unwrap_or_default();
        let name = segment.strip_suffix(".git").unwrap_or(segment);

        if name.is_empty() || name == "." || name == ".." {
            return Err(SyncError::Validation(format!(
                "Cannot derive a directory name from {}",
                url
            )));
        }

        Ok(name.to_string())
    }

    /// Two workers cloning or fetching into the same directory corrupt each
    /// other, so a batch may name every local path only once.
    pub fn validate_distinct_paths(requests: &[SyncRequest]) -> Result<()> {
        let mut seen: HashMap<PathBuf, &str> = HashMap::new();

        for request in requests {
            let key = normalize(&request.local_path);
            if let Some(previous) = seen.insert(key, &request.remote_url) {
                return Err(SyncError::Validation(format!(
                    "{} is the target of both {} and {}",
                    request.local_path.display(),
                    previous,
                    request.remote_url
                )));
            }
        }

        Ok(())
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
