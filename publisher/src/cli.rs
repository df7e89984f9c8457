//! CLI argument definitions for the Javadoc publisher.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::error::{PublishError, Result};
use crate::pipeline::PublishTarget;
use camino::Utf8PathBuf;
use clap::Parser;

/// Prefix of a git SCM connection string.
const SCM_GIT_PREFIX: &str = "scm:git:";

/// Publish Javadoc from Maven Central to a git-hosted static site.
#[derive(Parser, Debug, Clone)]
#[command(name = "javadoc-publisher")]
#[command(version, about)]
#[command(long_about = concat!(
    "Publish Javadoc from Maven Central to a git-hosted static site.\n\n",
    "The latest version of every module in GROUP_ID is downloaded from Maven ",
    "Central and extracted into DIRECTORY, a working copy of the gh-pages ",
    "branch of REPO_URL, under <major>.x/<artifact>/. Modules whose Javadoc is ",
    "already current are skipped. Everything published in one run is committed ",
    "and pushed together.\n\n",
    "Give ARTIFACT_ID and VERSION to publish one specific version instead.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Publish the latest Javadoc of a group:\n",
    "    $ javadoc-publisher ~/pages git@github.com:square/okio.git com.squareup.okio\n\n",
    "  Publish one version:\n",
    "    $ javadoc-publisher ~/pages git@github.com:square/okio.git \\\n",
    "        com.squareup.okio okio 2.10.0\n\n",
    "  Preview without committing:\n",
    "    $ javadoc-publisher --dry-run ~/pages git@github.com:square/okio.git com.squareup.okio",
))]
pub struct Cli {
    /// Working copy of the publishing branch (cloned when absent).
    #[arg(value_name = "DIRECTORY")]
    pub directory: Utf8PathBuf,

    /// Repository to publish to; `scm:git:` connection strings are accepted.
    #[arg(value_name = "REPO_URL")]
    pub repo_url: String,

    /// Maven group whose artifacts are published.
    #[arg(value_name = "GROUP_ID")]
    pub group_id: String,

    /// Publish only this artifact (requires VERSION).
    #[arg(value_name = "ARTIFACT_ID", requires = "artifact_version")]
    pub artifact_id: Option<String>,

    /// Version of ARTIFACT_ID to publish.
    #[arg(value_name = "VERSION", requires = "artifact_id")]
    pub artifact_version: Option<String>,

    /// Do everything except commit and push.
    #[arg(long)]
    pub dry_run: bool,

    /// Re-publish artifacts whose Javadoc is already current.
    #[arg(long)]
    pub force: bool,

    /// Configuration file [default: platform config directory].
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// The artifacts this invocation asks for.
    #[must_use]
    pub fn target(&self) -> PublishTarget {
        match (&self.artifact_id, &self.artifact_version) {
            (Some(artifact_id), Some(version)) => PublishTarget::Explicit {
                artifact_id: artifact_id.clone(),
                version: version.clone(),
            },
            _ => PublishTarget::Latest,
        }
    }

    /// The remote URL with any `scm:git:` prefix removed.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Usage`] for a non-git SCM connection string.
    pub fn remote_url(&self) -> Result<String> {
        repo_url_from_connection(&self.repo_url)
    }
}

/// Normalises a repository URL that may be an SCM connection string.
///
/// # Errors
///
/// Returns [`PublishError::Usage`] when `connection` names an SCM provider
/// other than git.
///
/// # Examples
///
/// ```
/// use javadoc_publisher::cli::repo_url_from_connection;
///
/// let url = repo_url_from_connection("scm:git:git@github.com:square/okio.git")?;
/// assert_eq!(url, "git@github.com:square/okio.git");
/// assert!(repo_url_from_connection("scm:svn:https://example.com/repo").is_err());
/// # Ok::<(), javadoc_publisher::error::PublishError>(())
/// ```
pub fn repo_url_from_connection(connection: &str) -> Result<String> {
    let connection = connection.trim();
    if let Some(url) = connection.strip_prefix(SCM_GIT_PREFIX) {
        if url.is_empty() {
            return Err(PublishError::Usage {
                reason: format!("connection {connection} names no repository"),
            });
        }
        return Ok(url.to_owned());
    }
    if connection.starts_with("scm:") {
        return Err(PublishError::Usage {
            reason: format!(
                "unsupported SCM connection {connection}; expected {SCM_GIT_PREFIX}<url>"
            ),
        });
    }
    Ok(connection.to_owned())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
