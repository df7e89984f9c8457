//! Package registry access.
//!
//! The publisher needs two things from a registry: the latest version of
//! every module in a group, and the Javadoc archive for one coordinate. The
//! [`Registry`] trait captures both so that tests can substitute a fake;
//! [`maven_central::MavenCentral`] is the production implementation.

pub mod maven_central;

use crate::artifact::Artifact;
use std::io::Read;

pub use maven_central::{MavenCentral, RegistrySettings};

/// Trait for querying a registry and fetching documentation archives.
///
/// # Examples
///
/// ```
/// use javadoc_publisher::registry::{MavenCentral, RegistrySettings};
///
/// let registry = MavenCentral::new(RegistrySettings::default());
/// // Use registry.latest_artifacts("com.squareup.okio") in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Registry {
    /// Returns the latest version of each module in `group_id`, in registry
    /// response order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the registry is unreachable, answers with a
    /// non-success status, or returns an undecodable body.
    fn latest_artifacts(&self, group_id: &str) -> Result<Vec<Artifact>, FetchError>;

    /// Opens the Javadoc archive of `artifact` as a byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails or the registry answers
    /// with a non-success status.
    fn download_doc_archive(&self, artifact: &Artifact) -> Result<Box<dyn Read>, FetchError>;
}

/// Errors arising from registry requests.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The registry answered with a non-success status.
    #[error("failed to download {url} ({status}):\n{body}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnosis.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("unexpected response from {url}: {reason}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// A description of the decoding failure.
        reason: String,
    },
}
