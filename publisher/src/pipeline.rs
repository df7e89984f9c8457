//! Publishing pipeline orchestration.
//!
//! One run brings the working copy up to date, then walks the candidate
//! artifacts in order. Each artifact that needs publishing is downloaded,
//! extracted into its bucket directory, marked with its version and staged.
//! The index of every touched bucket is then regenerated and a single commit
//! carries the whole run. A run that publishes nothing commits nothing.

use crate::artifact::Artifact;
use crate::decision::{Decision, PublishDecision};
use crate::error::{PublishError, Result};
use crate::extraction::{ArchiveExtractor, ExtractionError};
use crate::git::{CommitOutcome, RepositorySync};
use crate::index::IndexBuilder;
use crate::layout::PublishLayout;
use crate::marker::write_marker;
use crate::published::PublishedSet;
use crate::registry::Registry;
use camino::Utf8Path;
use log::{debug, info, warn};
use std::fmt;
use std::fs;

/// First line of every publishing commit.
pub const COMMIT_TITLE: &str = "Publish Javadoc";

/// Commit message accumulated over a run.
///
/// Renders as the title, a blank line, then one `group:artifact:version` line
/// per published artifact in the order they were published.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitMessage {
    lines: Vec<String>,
}

impl CommitMessage {
    /// Creates a message with no artifact lines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line for `artifact`.
    pub fn push(&mut self, artifact: &Artifact) {
        self.lines.push(artifact.to_string());
    }

    /// Whether no artifact has been appended.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{COMMIT_TITLE}")?;
        for line in &self.lines {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

/// Which artifacts of a group a run considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishTarget {
    /// The latest version of every module the registry lists.
    Latest,
    /// One explicitly named artifact version.
    Explicit {
        /// The module name.
        artifact_id: String,
        /// The version to publish.
        version: String,
    },
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSummary {
    /// Artifacts published this run, by bucket.
    pub published: PublishedSet,
    /// The commit result, or `None` when nothing was published.
    pub commit: Option<CommitOutcome>,
}

impl PublishSummary {
    /// Number of artifacts published.
    #[must_use]
    pub fn count(&self) -> usize {
        self.published.len()
    }
}

/// Drives one publishing run against a working copy.
pub struct PublishPipeline<'a> {
    registry: &'a dyn Registry,
    extractor: &'a dyn ArchiveExtractor,
    sync: &'a RepositorySync<'a>,
    layout: PublishLayout,
    decision: PublishDecision,
}

impl<'a> PublishPipeline<'a> {
    /// Creates a pipeline publishing into the working copy of `sync`.
    #[must_use]
    pub fn new(
        registry: &'a dyn Registry,
        extractor: &'a dyn ArchiveExtractor,
        sync: &'a RepositorySync<'a>,
        decision: PublishDecision,
    ) -> Self {
        Self {
            registry,
            extractor,
            sync,
            layout: PublishLayout::new(sync.working_copy().to_owned()),
            decision,
        }
    }

    /// The publish root layout.
    #[must_use]
    pub const fn layout(&self) -> &PublishLayout {
        &self.layout
    }

    /// Publishes `target` of `group_id` to the repository at `remote_url`.
    ///
    /// # Errors
    ///
    /// See [`PublishPipeline::run`].
    pub fn publish_target(
        &self,
        remote_url: &str,
        group_id: &str,
        target: &PublishTarget,
    ) -> Result<PublishSummary> {
        match target {
            PublishTarget::Latest => self.publish_latest(remote_url, group_id),
            PublishTarget::Explicit {
                artifact_id,
                version,
            } => self.publish(remote_url, group_id, artifact_id, version),
        }
    }

    /// Publishes the latest version of every module in `group_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Fetch`] if the registry listing fails, and
    /// otherwise see [`PublishPipeline::run`].
    pub fn publish_latest(&self, remote_url: &str, group_id: &str) -> Result<PublishSummary> {
        let artifacts = self.registry.latest_artifacts(group_id)?;
        info!("Registry returned {} artifact(s) for {group_id}", artifacts.len());
        self.run(remote_url, group_id, &artifacts)
    }

    /// Publishes one explicitly named artifact version.
    ///
    /// The artifact is assumed to ship a Javadoc archive.
    ///
    /// # Errors
    ///
    /// See [`PublishPipeline::run`].
    pub fn publish(
        &self,
        remote_url: &str,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<PublishSummary> {
        let artifact = Artifact::new(group_id, artifact_id, version);
        self.run(remote_url, group_id, std::slice::from_ref(&artifact))
    }

    /// Publishes `artifacts` in order and commits the result once.
    ///
    /// # Errors
    ///
    /// The first failure aborts the run: syncing the working copy, fetching
    /// or extracting an archive, writing a marker, staging, regenerating an
    /// index, or committing. Work already written to the working copy stays
    /// there uncommitted.
    pub fn run(
        &self,
        remote_url: &str,
        group_id: &str,
        artifacts: &[Artifact],
    ) -> Result<PublishSummary> {
        self.sync.ensure_up_to_date(remote_url)?;

        let mut published = PublishedSet::new();
        let mut message = CommitMessage::new();
        for artifact in artifacts {
            if published.contains(artifact) {
                debug!("Skipping {artifact}, already published this run");
                continue;
            }
            let artifact_dir = self.layout.dir_for(artifact);
            if !self.announce(artifact, &artifact_dir) {
                continue;
            }
            self.publish_one(artifact, &artifact_dir)?;
            message.push(artifact);
            published.record(artifact.clone());
        }

        let index_files = IndexBuilder::new(&self.layout).rebuild(group_id, &published, artifacts)?;
        for path in index_files {
            self.sync.stage(&path)?;
        }

        let commit = if published.is_empty() {
            info!("Nothing to publish");
            None
        } else {
            Some(self.sync.commit_and_push(&message.to_string())?)
        };
        Ok(PublishSummary { published, commit })
    }

    /// Logs the decision for `artifact` and returns whether to publish it.
    fn announce(&self, artifact: &Artifact, artifact_dir: &Utf8Path) -> bool {
        let decision = self.decision.evaluate(artifact, artifact_dir);
        match &decision {
            Decision::SkipNoJavadoc => info!("Skipping {artifact}, artifact has no Javadoc"),
            Decision::SkipUpToDate => info!("Skipping {artifact_dir}, artifact is up to date"),
            Decision::PublishForced => {
                warn!("{artifact_dir} is up to date, but downloading anyway due to --force");
            }
            Decision::PublishFirst => {}
            Decision::PublishChanged { previous } => {
                info!("Replacing {artifact_dir} version {previous}");
            }
        }
        decision.should_publish()
    }

    fn publish_one(&self, artifact: &Artifact, artifact_dir: &Utf8Path) -> Result<()> {
        info!("Downloading {artifact} to {artifact_dir}");
        let mut archive = self.registry.download_doc_archive(artifact)?;

        let extraction_error = |source| PublishError::Extraction {
            artifact: artifact.to_string(),
            source,
        };
        fs::create_dir_all(artifact_dir).map_err(|source| {
            extraction_error(ExtractionError::CreateDirectory {
                path: artifact_dir.to_owned(),
                source,
            })
        })?;
        let written = self
            .extractor
            .extract(&mut archive, artifact_dir)
            .map_err(extraction_error)?;
        info!("Extracted {written} file(s) for {artifact}");

        write_marker(artifact_dir, artifact.version()).map_err(|source| PublishError::Marker {
            path: PublishLayout::marker_path(artifact_dir),
            source,
        })?;
        self.sync.stage(artifact_dir)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
