// file: src/repository/syncer.rs
// description: clone a repository when absent, fetch all of its remotes when present
// reference: https://git-scm.com/docs/git-fetch

use crate::error::Result;
use crate::repository::git::{GitBackend, GitCli};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Span, info, warn};

/// One repository to bring up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub local_path: PathBuf,
    pub remote_url: String,
    pub fetch_if_present: bool,
}

impl SyncRequest {
    pub fn new(
        local_path: impl Into<PathBuf>,
        remote_url: impl Into<String>,
        fetch_if_present: bool,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            remote_url: remote_url.into(),
            fetch_if_present,
        }
    }
}

impl<P, U> From<(P, U, bool)> for SyncRequest
where
    P: Into<PathBuf>,
    U: Into<String>,
{
    fn from((local_path, remote_url, fetch_if_present): (P, U, bool)) -> Self {
        Self::new(local_path, remote_url, fetch_if_present)
    }
}

/// What a sync did. A clone reports the remote it came from, an existing
/// directory reports its own path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Cloned { remote_url: String },
    Present { local_path: PathBuf },
    Fetched { local_path: PathBuf, remotes: Vec<String> },
    Skipped { remote_url: String, status: i32 },
}

impl SyncOutcome {
    /// Flat string form: the remote URL for a clone, the local path for an
    /// existing directory, and an empty string for a skipped clone.
    pub fn to_result_string(&self) -> String {
        match self {
            SyncOutcome::Cloned { remote_url } => remote_url.clone(),
            SyncOutcome::Present { local_path } | SyncOutcome::Fetched { local_path, .. } => {
                local_path.display().to_string()
            }
            SyncOutcome::Skipped { .. } => String::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Cloned { .. } => "cloned",
            SyncOutcome::Present { .. } => "present",
            SyncOutcome::Fetched { .. } => "fetched",
            SyncOutcome::Skipped { .. } => "skipped",
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped { .. })
    }
}

pub struct RepositorySyncer {
    git: Arc<dyn GitBackend>,
    span: Span,
}

impl Default for RepositorySyncer {
    fn default() -> Self {
        Self::new(Arc::new(GitCli::default()))
    }
}

impl RepositorySyncer {
    pub fn new(git: Arc<dyn GitBackend>) -> Self {
        Self {
            git,
            span: Span::current(),
        }
    }

    /// Record this syncer's logs under `span` instead of the span current at
    /// construction time.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Clone `remote_url` into `local_path` when the directory is missing, or
    /// fetch every remote of the existing working copy when `fetch_if_present`
    /// is set.
    ///
    /// A clone that git rejects with status 128 (repository missing or access
    /// denied) is logged as a warning and reported as [`SyncOutcome::Skipped`].
    /// Every other failure is returned to the caller.
    pub fn sync(
        &self,
        local_path: &Path,
        remote_url: &str,
        fetch_if_present: bool,
    ) -> Result<SyncOutcome> {
        let _entered = self.span.enter();

        if !local_path.is_dir() {
            return self.clone_repository(local_path, remote_url);
        }

        if !fetch_if_present {
            info!("{} already present, leaving untouched", local_path.display());
            return Ok(SyncOutcome::Present {
                local_path: local_path.to_path_buf(),
            });
        }

        let remotes = self.fetch_repository(local_path)?;
        Ok(SyncOutcome::Fetched {
            local_path: local_path.to_path_buf(),
            remotes,
        })
    }

    /// Single-argument entry point for worker pools: unpacks the request and
    /// forwards to [`RepositorySyncer::sync`].
    pub fn dispatch(&self, request: impl Into<SyncRequest>) -> Result<SyncOutcome> {
        let request = request.into();
        self.sync(
            &request.local_path,
            &request.remote_url,
            request.fetch_if_present,
        )
    }

    fn clone_repository(&self, local_path: &Path, remote_url: &str) -> Result<SyncOutcome> {
        info!("Cloning {} into {}", remote_url, local_path.display());

        match self.git.clone_all_branches(remote_url, local_path) {
            Ok(()) => {
                info!("Cloned {}", remote_url);
                Ok(SyncOutcome::Cloned {
                    remote_url: remote_url.to_string(),
                })
            }
            Err(err) if err.is_skippable_clone() => {
                warn!(
                    remote_url,
                    local_path = %local_path.display(),
                    status = ?err.status(),
                    error = %err,
                    "Skipping repository that cannot be cloned"
                );
                Ok(SyncOutcome::Skipped {
                    remote_url: remote_url.to_string(),
                    status: crate::error::GIT_FATAL_STATUS,
                })
            }
            Err(err) => Err(err),
        }
    }

    fn fetch_repository(&self, local_path: &Path) -> Result<Vec<String>> {
        self.git.open(local_path)?;
        let remotes = self.git.remotes(local_path)?;

        for remote in &remotes {
            info!("Fetching {} in {}", remote, local_path.display());
            self.git.fetch(local_path, remote)?;
        }

        Ok(remotes)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeGit;
    use super::*;
    use crate::error::SyncError;
    use crate::repository::git::testing::{git, git_available, has_ref, init_upstream};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tracing::Level;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    struct WarningCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarningCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn count_warnings<T>(f: impl FnOnce() -> T) -> (T, usize) {
        let counter = Arc::new(AtomicUsize::new(0));
        let subscriber = Registry::default().with(WarningCounter(counter.clone()));
        let value = tracing::subscriber::with_default(subscriber, f);
        (value, counter.load(Ordering::SeqCst))
    }

    #[test]
    fn test_clone_when_absent_returns_remote_url() {
        let temp = TempDir::new().unwrap();
        let git = Arc::new(FakeGit::default());
        let syncer = RepositorySyncer::new(git.clone());
        let path = temp.path().join("repo");

        let outcome = syncer
            .sync(&path, "https://example.com/org/repo.git", true)
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Cloned {
                remote_url: "https://example.com/org/repo.git".to_string()
            }
        );
        assert_eq!(outcome.to_result_string(), "https://example.com/org/repo.git");
        assert_eq!(git.calls(), vec!["clone https://example.com/org/repo.git"]);
    }

    #[test]
    fn test_present_without_fetch_runs_no_git() {
        let temp = TempDir::new().unwrap();
        let git = Arc::new(FakeGit::with_remotes(&["origin"]));
        let syncer = RepositorySyncer::new(git.clone());

        let outcome = syncer
            .sync(temp.path(), "https://example.com/org/repo.git", false)
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Present {
                local_path: temp.path().to_path_buf()
            }
        );
        assert_eq!(outcome.to_result_string(), temp.path().display().to_string());
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_present_with_fetch_fetches_every_remote_in_order() {
        let temp = TempDir::new().unwrap();
        let git = Arc::new(FakeGit::with_remotes(&["origin", "upstream", "backup"]));
        let syncer = RepositorySyncer::new(git.clone());

        let outcome = syncer
            .sync(temp.path(), "https://example.com/org/repo.git", true)
            .unwrap();

        assert_eq!(outcome.to_result_string(), temp.path().display().to_string());
        assert_eq!(outcome.label(), "fetched");
        assert_eq!(
            git.calls(),
            vec![
                format!("open {}", temp.path().display()),
                "remotes".to_string(),
                "fetch origin".to_string(),
                "fetch upstream".to_string(),
                "fetch backup".to_string(),
            ]
        );
    }

    #[test]
    fn test_fetch_failure_stops_and_propagates() {
        let temp = TempDir::new().unwrap();
        let mut fake = FakeGit::with_remotes(&["origin", "upstream", "backup"]);
        fake.failing_remote = Some("upstream".to_string());
        let git = Arc::new(fake);
        let syncer = RepositorySyncer::new(git.clone());

        let err = syncer
            .sync(temp.path(), "https://example.com/org/repo.git", true)
            .unwrap_err();

        assert!(matches!(err, SyncError::Fetch { ref remote, .. } if remote == "upstream"));
        assert!(!git.calls().contains(&"fetch backup".to_string()));
    }

    #[test]
    fn test_status_128_is_skipped_with_one_warning() {
        let temp = TempDir::new().unwrap();
        let url = "https://example.com/org/private.git";
        let git = Arc::new(FakeGit::default().failing_clone(url, 128));
        let syncer = RepositorySyncer::new(git.clone());
        let path = temp.path().join("private");

        let (outcome, warnings) = count_warnings(|| syncer.sync(&path, url, true));
        let outcome = outcome.unwrap();

        assert!(outcome.is_skipped());
        assert_eq!(outcome.to_result_string(), "");
        assert_eq!(warnings, 1);
        assert_eq!(git.calls().len(), 1);
    }

    #[test]
    fn test_other_clone_status_is_fatal() {
        let temp = TempDir::new().unwrap();
        let url = "https://example.com/org/broken.git";
        let git = Arc::new(FakeGit::default().failing_clone(url, 1));
        let syncer = RepositorySyncer::new(git.clone());

        let (result, warnings) =
            count_warnings(|| syncer.sync(&temp.path().join("broken"), url, false));

        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(1));
        assert_eq!(warnings, 0);
        assert_eq!(git.calls().len(), 1);
    }

    #[test]
    fn test_dispatch_matches_sync_for_every_case() {
        let temp = TempDir::new().unwrap();
        let skipped_url = "https://example.com/org/private.git";
        let fatal_url = "https://example.com/org/broken.git";
        let make = || {
            Arc::new(
                FakeGit::with_remotes(&["origin", "mirror"])
                    .failing_clone(skipped_url, 128)
                    .failing_clone(fatal_url, 2),
            )
        };

        let existing = temp.path().join("existing");
        std::fs::create_dir(&existing).unwrap();

        let cases = vec![
            (temp.path().join("a"), "https://example.com/org/a.git", true),
            (existing.clone(), "https://example.com/org/b.git", false),
            (existing.clone(), "https://example.com/org/b.git", true),
            (temp.path().join("c"), skipped_url, true),
            (temp.path().join("d"), fatal_url, false),
        ];

        for (path, url, fetch) in cases {
            let direct_git = make();
            let direct = RepositorySyncer::new(direct_git.clone()).sync(&path, url, fetch);
            let _ = std::fs::remove_dir_all(temp.path().join("a"));

            let adapter_git = make();
            let adapted =
                RepositorySyncer::new(adapter_git.clone()).dispatch((path.clone(), url, fetch));
            let _ = std::fs::remove_dir_all(temp.path().join("a"));

            match (direct, adapted) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
                (a, b) => panic!("diverging results: {:?} vs {:?}", a, b),
            }
            assert_eq!(direct_git.calls(), adapter_git.calls());
        }
    }

    #[test]
    fn test_clone_and_fetch_against_real_git() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        init_upstream(&upstream);
        let url = upstream.to_string_lossy().to_string();
        let local = temp.path().join("local");
        let syncer = RepositorySyncer::default();

        let outcome = syncer.sync(&local, &url, true).unwrap();
        assert_eq!(outcome.to_result_string(), url);
        assert!(local.join("README.md").is_file());
        assert!(has_ref(&local, "refs/remotes/origin/feature"));

        git(&upstream, &["branch", "later"]);
        let outcome = syncer.sync(&local, &url, true).unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Fetched {
                local_path: local.clone(),
                remotes: vec!["origin".to_string()],
            }
        );
        assert!(has_ref(&local, "refs/remotes/origin/later"));
    }

    #[test]
    fn test_present_without_fetch_leaves_real_clone_untouched() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        init_upstream(&upstream);
        let url = upstream.to_string_lossy().to_string();
        let local = temp.path().join("local");
        let syncer = RepositorySyncer::default();
        syncer.sync(&local, &url, false).unwrap();

        git(&upstream, &["branch", "later"]);
        let outcome = syncer.sync(&local, &url, false).unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Present {
                local_path: local.clone()
            }
        );
        assert!(has_ref(&local, "refs/remotes/origin/feature"));
        assert!(!has_ref(&local, "refs/remotes/origin/later"));
    }

    #[test]
    fn test_outcome_serializes_with_outcome_tag() {
        let outcomes = vec![
            SyncOutcome::Cloned {
                remote_url: "https://host/a.git".to_string(),
            },
            SyncOutcome::Present {
                local_path: PathBuf::from("m/b"),
            },
            SyncOutcome::Fetched {
                local_path: PathBuf::from("m/c"),
                remotes: vec!["origin".to_string(), "mirror".to_string()],
            },
            SyncOutcome::Skipped {
                remote_url: "https://host/d.git".to_string(),
                status: 128,
            },
        ];

        for outcome in outcomes {
            let value = serde_json::to_value(&outcome).unwrap();
            assert_eq!(value["outcome"], outcome.label());

            let decoded: SyncOutcome = serde_json::from_value(value).unwrap();
            assert_eq!(decoded, outcome);
        }

        let value = serde_json::to_value(SyncOutcome::Skipped {
            remote_url: "https://host/d.git".to_string(),
            status: 128,
        })
        .unwrap();
        assert_eq!(value["status"], 128);
    }

    #[test]
    fn test_missing_upstream_is_skipped_against_real_git() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let url = temp.path().join("nowhere").to_string_lossy().to_string();
        let local = temp.path().join("local");

        let outcome = RepositorySyncer::default().sync(&local, &url, true).unwrap();
        assert!(outcome.is_skipped());
        assert!(!local.exists());
    }
}
