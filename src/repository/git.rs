// file: src/repository/git.rs
// description: git operations needed for clone-or-fetch, backed by the git executable
// reference: https://git-scm.com/docs/git-clone

use crate::error::{Result, SyncError};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

/// The version-control operations the syncer depends on.
///
/// Every failing git invocation carries the exit status of the process, which
/// is how a clone of a missing or private repository (status 128) is told apart
/// from other failures.
pub trait GitBackend: Send + Sync {
    /// Clone `url` into `path`, fetching every branch of the remote.
    fn clone_all_branches(&self, url: &str, path: &Path) -> Result<()>;

    /// Check that `path` is the top level of a git working copy, or the git
    /// directory of a bare repository.
    fn open(&self, path: &Path) -> Result<()>;

    /// Remote names of the working copy at `path`, in registration order.
    fn remotes(&self, path: &Path) -> Result<Vec<String>>;

    /// Fetch a single remote of the working copy at `path`.
    fn fetch(&self, path: &Path, remote: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
        let mut command = Command::new(&self.program);
        command.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        debug!("Running {} {}", self.program, args.join(" "));

        command.output().map_err(|source| SyncError::GitUnavailable {
            program: self.program.clone(),
            source,
        })
    }
}

impl GitCli {
    fn rev_parse(&self, path: &Path, flag: &str) -> Result<String> {
        let output = self.run(Some(path), &["rev-parse", flag])?;

        if !output.status.success() {
            return Err(SyncError::Open {
                path: path.to_path_buf(),
                status: output.status.code(),
                stderr: stderr_of(&output),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl GitBackend for GitCli {
    fn clone_all_branches(&self, url: &str, path: &Path) -> Result<()> {
        let target = path.to_string_lossy();
        let output = self.run(None, &["clone", "--no-single-branch", "--", url, target.as_ref()])?;

        if !output.status.success() {
            return Err(SyncError::Clone {
                url: url.to_string(),
                path: path.to_path_buf(),
                status: output.status.code(),
                stderr: stderr_of(&output),
            });
        }

        Ok(())
    }

    fn open(&self, path: &Path) -> Result<()> {
        let bare = self.rev_parse(path, "--is-bare-repository")? == "true";
        let root = if bare {
            self.rev_parse(path, "--git-dir")?
        } else {
            self.rev_parse(path, "--show-toplevel")?
        };

        // --git-dir may be relative to `path`
        let expected = fs::canonicalize(path)?;
        let actual = fs::canonicalize(path.join(&root))?;

        if expected != actual {
            return Err(SyncError::Open {
                path: path.to_path_buf(),
                status: None,
                stderr: format!("directory is inside the repository at {}", actual.display()),
            });
        }

        Ok(())
    }

    // `git remote` sorts its listing; the config keys keep file order.
    fn remotes(&self, path: &Path) -> Result<Vec<String>> {
        let output = self.run(
            Some(path),
            &["config", "--local", "--get-regexp", r"^remote\..*\.url$"],
        )?;

        // status 1: no key matched
        if output.status.code() == Some(1) {
            return Ok(Vec::new());
        }

        if !output.status.success() {
            return Err(SyncError::Open {
                path: path.to_path_buf(),
                status: output.status.code(),
                stderr: stderr_of(&output),
            });
        }

        let mut remotes: Vec<String> = Vec::new();
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            let key = line.split_whitespace().next().unwrap_or_default();
            let name = key
                .strip_prefix("remote.")
                .and_then(|rest| rest.strip_suffix(".url"));
            if let Some(name) = name {
                if !remotes.iter().any(|known| known == name) {
                    remotes.push(name.to_string());
                }
            }
        }

        Ok(remotes)
    }

    fn fetch(&self, path: &Path, remote: &str) -> Result<()> {
        let output = self.run(Some(path), &["fetch", remote])?;

        if !output.status.success() {
            return Err(SyncError::Fetch {
                path: path.to_path_buf(),
                remote: remote.to_string(),
                status: output.status.code(),
                stderr: stderr_of(&output),
            });
        }

        Ok(())
    }
}
