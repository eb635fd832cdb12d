// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for batch synchronization
// reference: uses indicatif for progress bars and tracks per-repository outcomes

use crate::repository::SyncOutcome;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    pub cloned: usize,
    pub present: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration_secs: u64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.cloned + self.present + self.fetched + self.skipped + self.failed
    }

    pub fn repositories_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.total() as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        ((total - self.failed) as f64 / total as f64) * 100.0
    }
}

#[derive(Default)]
struct Counters {
    cloned: AtomicUsize,
    present: AtomicUsize,
    fetched: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    counters: Arc<Counters>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn with_color(total_repositories: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();
        Self::build(multi_progress, total_repositories, colored)
    }

    /// Tracker that counts without drawing anything.
    pub fn hidden(total_repositories: usize) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        Self::build(multi_progress, total_repositories, false)
    }

    fn build(multi_progress: MultiProgress, total: usize, colored: bool) -> Self {
        let main_bar = create_progress_bar(&multi_progress, total as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            counters: Arc::new(Counters::default()),
            start_time: Instant::now(),
        }
    }

    pub fn record_outcome(&self, outcome: &SyncOutcome) {
        let counter = match outcome {
            SyncOutcome::Cloned { .. } => &self.counters.cloned,
            SyncOutcome::Present { .. } => &self.counters.present,
            SyncOutcome::Fetched { .. } => &self.counters.fetched,
            SyncOutcome::Skipped { .. } => &self.counters.skipped,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn record_failure(&self) {
        self.counters.failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Synchronization complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> SyncStats {
        SyncStats {
            cloned: self.counters.cloned.load(Ordering::SeqCst),
            present: self.counters.present.load(Ordering::SeqCst),
            fetched: self.counters.fetched.load(Ordering::SeqCst),
            skipped: self.counters.skipped.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Cloned: {} | Fetched: {} | Skipped: {} | Failed: {}",
            self.counters.cloned.load(Ordering::SeqCst),
            self.counters.fetched.load(Ordering::SeqCst),
            self.counters.skipped.load(Ordering::SeqCst),
            self.counters.failed.load(Ordering::SeqCst),
        );

        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}
