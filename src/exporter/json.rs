// file: src/exporter/json.rs
// description: json report of a batch synchronization run

use crate::error::Result;
use crate::pipeline::{SyncStats, SyncSummary};
use crate::repository::SyncOutcome;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ExportedRepository {
    pub remote_url: String,
    pub local_path: String,
    pub status: &'static str,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SyncOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub generated_at: String,
    pub started_at: String,
    pub finished_at: String,
    pub stats: SyncStats,
    pub repositories: Vec<ExportedRepository>,
}

impl From<&SyncSummary> for SyncReport {
    fn from(summary: &SyncSummary) -> Self {
        let repositories = summary
            .entries
            .iter()
            .map(|entry| ExportedRepository {
                remote_url: entry.request.remote_url.clone(),
                local_path: entry.request.local_path.display().to_string(),
                status: entry.status_label(),
                result: entry.result_string(),
                outcome: entry.result.as_ref().ok().cloned(),
                error: entry.result.as_ref().err().cloned(),
            })
            .collect();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            started_at: summary.started_at.to_rfc3339(),
            finished_at: summary.finished_at.to_rfc3339(),
            stats: summary.stats.clone(),
            repositories,
        }
    }
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn write_summary(&self, summary: &SyncSummary, pretty: bool) -> Result<PathBuf> {
        let report = SyncReport::from(summary);

        let contents = if pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };

        let file_name = format!(
            "sync-report-{}.json",
            summary.finished_at.format("%Y%m%dT%H%M%S%.3fZ")
        );
        let path = self.output_dir.join(file_name);
        fs::write(&path, contents)?;

        info!(
            "Report for {} repositories written to {}",
            report.repositories.len(),
            path.display()
        );
        Ok(path)
    }
}
