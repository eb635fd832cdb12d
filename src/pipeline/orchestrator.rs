// file: src/pipeline/orchestrator.rs
// description: runs many clone-or-fetch requests on a bounded pool of blocking workers
// reference: orchestrates asynchronous synchronization workflow

use crate::error::{Result, SyncError};
use crate::pipeline::progress::{ProgressTracker, SyncStats};
use crate::repository::{RepositorySyncer, SyncOutcome, SyncRequest};
use crate::utils::Validator;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

/// Result of one request within a batch. Errors are kept as their message so
/// one failing repository does not abort the others.
#[derive(Debug, Clone)]
pub struct SyncEntry {
    pub request: SyncRequest,
    pub result: std::result::Result<SyncOutcome, String>,
}

impl SyncEntry {
    pub fn status_label(&self) -> &'static str {
        match &self.result {
            Ok(outcome) => outcome.label(),
            Err(_) => "failed",
        }
    }

    /// Flat string form of the outcome, empty for failures.
    pub fn result_string(&self) -> String {
        match &self.result {
            Ok(outcome) => outcome.to_result_string(),
            Err(_) => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<SyncEntry>,
    pub stats: SyncStats,
}

impl SyncSummary {
    pub fn failures(&self) -> impl Iterator<Item = &SyncEntry> {
        self.entries.iter().filter(|entry| entry.result.is_err())
    }

    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }
}

pub struct BatchSync {
    syncer: Arc<RepositorySyncer>,
    max_concurrent_tasks: usize,
    show_progress: bool,
    colored: bool,
}

impl BatchSync {
    pub fn new(syncer: RepositorySyncer, parallel_workers: usize) -> Self {
        Self {
            syncer: Arc::new(syncer),
            max_concurrent_tasks: parallel_workers.max(1),
            show_progress: false,
            colored: false,
        }
    }

    pub fn with_progress(mut self, colored: bool) -> Self {
        self.show_progress = true;
        self.colored = colored;
        self
    }

    pub async fn run(&self, requests: Vec<SyncRequest>) -> Result<SyncSummary> {
        Validator::validate_distinct_paths(&requests)?;

        let started_at = Utc::now();
        info!(
            "Synchronizing {} repositories with {} workers",
            requests.len(),
            self.max_concurrent_tasks
        );

        let progress = Arc::new(if self.show_progress {
            ProgressTracker::with_color(requests.len(), self.colored)
        } else {
            ProgressTracker::hidden(requests.len())
        });

        let tasks = requests.into_iter().enumerate().map(|(index, request)| {
            let syncer = Arc::clone(&self.syncer);
            let progress = Arc::clone(&progress);
            let span = info_span!("repository", url = %request.remote_url);
            let worker_span = span.clone();

            async move {
                let worker_request = request.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let _entered = worker_span.enter();
                    syncer.dispatch(worker_request)
                })
                .await
                .map_err(|e| SyncError::Worker(e.to_string()));

                let result = match joined {
                    Ok(Ok(outcome)) => {
                        progress.record_outcome(&outcome);
                        Ok(outcome)
                    }
                    Ok(Err(err)) | Err(err) => {
                        error!("{} failed: {}", request.remote_url, err);
                        progress.record_failure();
                        Err(err.to_string())
                    }
                };

                (index, SyncEntry { request, result })
            }
            .instrument(span)
        });

        let mut entries: Vec<(usize, SyncEntry)> = stream::iter(tasks)
            .buffer_unordered(self.max_concurrent_tasks)
            .collect()
            .await;
        entries.sort_by_key(|(index, _)| *index);

        let stats = progress.get_stats();
        progress.finish();

        let summary = SyncSummary {
            started_at,
            finished_at: Utc::now(),
            entries: entries.into_iter().map(|(_, entry)| entry).collect(),
            stats,
        };

        self.log_final_stats(&summary.stats);
        Ok(summary)
    }

    fn log_final_stats(&self, stats: &SyncStats) {
        info!("Synchronization finished in {}s", stats.duration_secs);
        info!(
            "Throughput: {:.2} repositories/s, success rate: {:.1}%",
            stats.repositories_per_second(),
            stats.success_rate()
        );
        info!(
            "Cloned: {}, present: {}, fetched: {}, skipped: {}",
            stats.cloned, stats.present, stats.fetched, stats.skipped
        );
        if stats.failed > 0 {
            warn!("{} repositories failed", stats.failed);
        }
    }
}
