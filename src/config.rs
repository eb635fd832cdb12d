// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, SyncError};
use crate::repository::SyncRequest;
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/repositories.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub sync: SyncConfig,
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    pub root_dir: PathBuf,
    #[serde(default = "default_parallel_workers")]
    pub parallel_workers: usize,
    #[serde(default)]
    pub fetch_if_present: bool,
    #[serde(default = "default_git_executable")]
    pub git_executable: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepositoryEntry {
    pub url: String,
    /// Target directory, relative to `root_dir` unless absolute. Derived from
    /// the URL when omitted.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_parallel_workers() -> usize {
    4
}

fn default_git_executable() -> String {
    "git".to_string()
}

impl RepositoryEntry {
    pub fn local_path(&self, root_dir: &Path) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(root_dir.join(path)),
            None => Ok(root_dir.join(Validator::directory_name_for(&self.url)?)),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("REPO_SYNC")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            sync: SyncConfig {
                root_dir: PathBuf::from("./mirrors"),
                parallel_workers: default_parallel_workers(),
                fetch_if_present: true,
                git_executable: default_git_executable(),
            },
            repositories: vec![],
        }
    }

    /// One request per configured repository. `fetch_override` replaces the
    /// configured `fetch_if_present` when given.
    pub fn requests(&self, fetch_override: Option<bool>) -> Result<Vec<SyncRequest>> {
        let fetch = fetch_override.unwrap_or(self.sync.fetch_if_present);

        self.repositories
            .iter()
            .map(|entry| -> Result<SyncRequest> {
                Ok(SyncRequest::new(
                    entry.local_path(&self.sync.root_dir)?,
                    entry.url.trim(),
                    fetch,
                ))
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.sync.parallel_workers == 0 {
            return Err(SyncError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.sync.git_executable.trim().is_empty() {
            return Err(SyncError::Config(
                "git_executable must not be empty".to_string(),
            ));
        }

        for entry in &self.repositories {
            Validator::validate_remote_url(&entry.url)
                .map_err(|e| SyncError::Config(e.to_string()))?;
        }

        let requests = self.requests(None).map_err(|e| SyncError::Config(e.to_string()))?;
        Validator::validate_distinct_paths(&requests)
            .map_err(|e| SyncError::Config(e.to_string()))?;

        Ok(())
    }
}
