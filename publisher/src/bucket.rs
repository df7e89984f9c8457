//! Major-line version buckets.
//!
//! Published documentation is partitioned by a coarse version key so that
//! each major line keeps its own directory and index page. The key is used
//! for paths and grouping only, never for version comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coarse version partition such as `2.x`.
///
/// # Examples
///
/// ```
/// use javadoc_publisher::bucket::VersionBucket;
///
/// assert_eq!(VersionBucket::for_version("2.5.0").as_str(), "2.x");
/// assert_eq!(VersionBucket::for_version("10.0.1").as_str(), "10.x");
/// assert_eq!(VersionBucket::for_version("5").as_str(), "5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionBucket(String);

impl VersionBucket {
    /// Derives the bucket for a version string.
    ///
    /// The version is split on its first `.`; when a dot is present the
    /// bucket is `<first segment>.x`, otherwise the version is used as-is.
    #[must_use]
    pub fn for_version(version: &str) -> Self {
        match version.split_once('.') {
            Some((major, _)) => Self(format!("{major}.x")),
            None => Self(version.to_owned()),
        }
    }

    /// Returns the bucket key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VersionBucket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
