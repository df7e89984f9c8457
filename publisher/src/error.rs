//! Error types for the Javadoc publisher.
//!
//! Each component owns its error enum; [`PublishError`] wraps them for the
//! pipeline and the binary, adding the artifact or path where the component
//! error alone would not say which publish failed.

use crate::config::ConfigError;
use crate::extraction::ExtractionError;
use crate::git::SyncError;
use crate::index::IndexError;
use crate::registry::FetchError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort a publishing run.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The registry could not list artifacts or serve an archive.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An artifact's archive could not be extracted.
    #[error("failed to extract Javadoc for {artifact}: {source}")]
    Extraction {
        /// The artifact being published, as `group:artifact:version`.
        artifact: String,
        /// The extraction failure.
        #[source]
        source: ExtractionError,
    },

    /// The version marker could not be written after extraction.
    #[error("failed to write version marker {path}: {source}")]
    Marker {
        /// The marker file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An index page or roster could not be regenerated.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A git operation on the working copy failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The invocation was well-formed but cannot be acted on.
    #[error("usage error: {reason}")]
    Usage {
        /// What is wrong with the invocation.
        reason: String,
    },
}

/// Result type alias using [`PublishError`].
pub type Result<T> = std::result::Result<T, PublishError>;
