//! Whether an artifact's documentation needs to be (re)published.
//!
//! The decision compares the artifact's latest version with the marker left
//! by the previous publish. It never mutates anything; the pipeline acts on
//! the outcome.

use crate::artifact::Artifact;
use crate::marker::read_marker;
use camino::Utf8Path;
use log::warn;

/// Outcome of evaluating one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The registry has no Javadoc archive for the artifact.
    SkipNoJavadoc,
    /// The marker already records the artifact's latest version.
    SkipUpToDate,
    /// No marker exists yet.
    PublishFirst,
    /// The marker records a different version.
    PublishChanged {
        /// Version recorded by the marker.
        previous: String,
    },
    /// The marker is current but a re-publish was forced.
    PublishForced,
}

impl Decision {
    /// Returns `true` when the artifact should be fetched and extracted.
    #[must_use]
    pub const fn should_publish(&self) -> bool {
        !matches!(self, Self::SkipNoJavadoc | Self::SkipUpToDate)
    }
}

/// Marker-based publish policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishDecision {
    force: bool,
}

impl PublishDecision {
    /// Creates a policy; `force` re-publishes artifacts whose marker is
    /// current.
    #[must_use]
    pub const fn new(force: bool) -> Self {
        Self { force }
    }

    /// Whether up-to-date artifacts are re-published anyway.
    #[must_use]
    pub const fn is_forced(&self) -> bool {
        self.force
    }

    /// Evaluates `artifact` against the marker in `artifact_dir`.
    ///
    /// The marker must match the latest version byte for byte to count as
    /// current. An unreadable marker is treated like a missing one.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use javadoc_publisher::artifact::Artifact;
    /// use javadoc_publisher::decision::{Decision, PublishDecision};
    ///
    /// let artifact = Artifact::new("com.example", "widget", "1.0.0").with_javadoc(false);
    /// let decision = PublishDecision::new(true).evaluate(&artifact, Utf8Path::new("/nowhere"));
    /// assert_eq!(decision, Decision::SkipNoJavadoc);
    /// ```
    #[must_use]
    pub fn evaluate(&self, artifact: &Artifact, artifact_dir: &Utf8Path) -> Decision {
        if !artifact.has_javadoc() {
            return Decision::SkipNoJavadoc;
        }

        let marker = match read_marker(artifact_dir) {
            Ok(marker) => marker,
            Err(e) => {
                warn!("ignoring unreadable version marker in {artifact_dir}: {e}");
                None
            }
        };

        match marker {
            None => Decision::PublishFirst,
            Some(previous) if previous == artifact.version() => {
                if self.force {
                    Decision::PublishForced
                } else {
                    Decision::SkipUpToDate
                }
            }
            Some(previous) => Decision::PublishChanged { previous },
        }
    }

    /// Shorthand for `self.evaluate(..).should_publish()`.
    #[must_use]
    pub fn should_publish(&self, artifact: &Artifact, artifact_dir: &Utf8Path) -> bool {
        self.evaluate(artifact, artifact_dir).should_publish()
    }
}
