//! Git operations on the publishing working copy.
//!
//! The working copy is a single-branch clone of the publishing branch. It is
//! cloned when absent and pulled when present, accumulates staged paths
//! during a run, and receives one commit and push at the end of the run.
//! Every git command runs through a [`CommandExecutor`] with the working
//! directory passed explicitly.

use crate::process::{CommandExecutor, Invocation, ProcessError};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::fs;
use std::io;

/// Default branch that holds the published pages.
pub const DEFAULT_BRANCH: &str = "gh-pages";

/// Default remote that receives the push.
pub const DEFAULT_REMOTE: &str = "origin";

/// Errors raised while synchronising the working copy.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A stale path could not be removed before cloning.
    #[error("failed to remove stale path {path}: {source}")]
    Clean {
        /// The path that could not be removed.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The parent directory of the working copy could not be created.
    #[error("failed to create {path}: {source}")]
    CreateParent {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A git command failed or timed out.
    #[error("git {operation} failed: {source}")]
    Git {
        /// The git operation that failed (clone, pull, etc.).
        operation: &'static str,
        /// The process failure, including captured output.
        #[source]
        source: ProcessError,
    },
}

/// How [`RepositorySync::ensure_up_to_date`] prepared the working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingCopyAction {
    /// A fresh single-branch clone was made.
    Cloned,
    /// The existing working copy was pulled.
    Pulled,
}

/// Result of [`RepositorySync::commit_and_push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The commit was created and pushed.
    Pushed,
    /// Dry-run mode: nothing was committed or pushed.
    DryRun {
        /// The commit message that would have been used.
        message: String,
    },
}

/// Branch, remote, and dry-run settings for a [`RepositorySync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Branch holding the published pages.
    pub branch: String,
    /// Remote that receives the push.
    pub remote: String,
    /// Replace commit and push with a report of the commit message.
    pub dry_run: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_owned(),
            remote: DEFAULT_REMOTE.to_owned(),
            dry_run: false,
        }
    }
}

/// Git-backed persistence for one working copy.
pub struct RepositorySync<'a> {
    executor: &'a dyn CommandExecutor,
    working_copy: Utf8PathBuf,
    settings: SyncSettings,
}

impl<'a> RepositorySync<'a> {
    /// Creates a sync for the working copy at `working_copy`.
    ///
    /// The path should be absolute; it is used both as the clone target
    /// and as the working directory of every later git command.
    #[must_use]
    pub fn new(
        executor: &'a dyn CommandExecutor,
        working_copy: impl Into<Utf8PathBuf>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            executor,
            working_copy: working_copy.into(),
            settings,
        }
    }

    /// The working copy directory.
    #[must_use]
    pub fn working_copy(&self) -> &Utf8Path {
        &self.working_copy
    }

    /// Whether commit and push are replaced by a report.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.settings.dry_run
    }

    /// Clones the publishing branch when the working copy is absent and
    /// pulls it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if removing a stale path, creating the parent
    /// directory, cloning, or pulling fails.
    pub fn ensure_up_to_date(&self, remote_url: &str) -> Result<WorkingCopyAction, SyncError> {
        if self.working_copy.is_dir() {
            info!("Pulling latest from {remote_url} to {}", self.working_copy);
            let pull = Invocation::new("git").arg("pull").current_dir(&self.working_copy);
            self.git("pull", &pull)?;
            return Ok(WorkingCopyAction::Pulled);
        }

        info!("Checking out {remote_url} to {}", self.working_copy);
        remove_stale_path(&self.working_copy)?;

        let mut clone = Invocation::new("git").args([
            "clone",
            "--single-branch",
            "--branch",
            self.settings.branch.as_str(),
            remote_url,
            self.working_copy.as_str(),
        ]);
        if let Some(parent) = self.working_copy.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SyncError::CreateParent {
                path: parent.to_owned(),
                source,
            })?;
            clone = clone.current_dir(parent);
        }
        self.git("clone", &clone)?;
        Ok(WorkingCopyAction::Cloned)
    }

    /// Stages `path` for the next commit.
    ///
    /// Paths inside the working copy are passed to git relative to it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Git`] if `git add` fails.
    pub fn stage(&self, path: &Utf8Path) -> Result<(), SyncError> {
        let relative = path.strip_prefix(&self.working_copy).unwrap_or(path);
        let target = if relative.as_str().is_empty() {
            "."
        } else {
            relative.as_str()
        };
        self.git(
            "add",
            &Invocation::new("git")
                .args(["add", target])
                .current_dir(&self.working_copy),
        )
    }

    /// Commits everything staged with `message` and pushes the publishing
    /// branch.
    ///
    /// In dry-run mode nothing runs; the message is logged and returned.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Git`] if the commit or the push fails.
    pub fn commit_and_push(&self, message: &str) -> Result<CommitOutcome, SyncError> {
        if self.settings.dry_run {
            info!("DRY-RUN: git commit -m {message}");
            info!(
                "DRY-RUN: git push {} {}",
                self.settings.remote, self.settings.branch
            );
            return Ok(CommitOutcome::DryRun {
                message: message.to_owned(),
            });
        }

        self.git(
            "commit",
            &Invocation::new("git")
                .args(["commit", "-m", message])
                .current_dir(&self.working_copy),
        )?;
        self.git(
            "push",
            &Invocation::new("git")
                .args([
                    "push",
                    self.settings.remote.as_str(),
                    self.settings.branch.as_str(),
                ])
                .current_dir(&self.working_copy),
        )?;
        Ok(CommitOutcome::Pushed)
    }

    fn git(&self, operation: &'static str, invocation: &Invocation) -> Result<(), SyncError> {
        self.executor
            .run(invocation)
            .map(drop)
            .map_err(|source| SyncError::Git { operation, source })
    }
}

/// Removes whatever occupies `path` (a file, symlink, or directory).
fn remove_stale_path(path: &Utf8Path) -> Result<(), SyncError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(SyncError::Clean {
                path: path.to_owned(),
                source,
            });
        }
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|source| SyncError::Clean {
        path: path.to_owned(),
        source,
    })
}
