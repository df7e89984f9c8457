//! Directory layout of the publish root.
//!
//! Every path the publisher writes is constructed here from the bucket and
//! artifact identifier, so extraction, markers, rosters, and index links
//! all agree on where an artifact lives:
//!
//! ```text
//! <root>/<bucket>/index.html
//! <root>/<bucket>/artifacts.json
//! <root>/<bucket>/<artifactId>/...
//! <root>/<bucket>/<artifactId>/version.txt
//! ```

use crate::artifact::Artifact;
use crate::bucket::VersionBucket;
use camino::{Utf8Path, Utf8PathBuf};

/// File name of the per-artifact version marker.
pub const MARKER_FILENAME: &str = "version.txt";

/// File name of the per-bucket index page.
pub const INDEX_FILENAME: &str = "index.html";

/// File name of the per-bucket artifact roster.
pub const ROSTER_FILENAME: &str = "artifacts.json";

/// Path index for a publish root (the git working copy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishLayout {
    root: Utf8PathBuf,
}

impl PublishLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The publish root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory holding every artifact of `bucket`.
    #[must_use]
    pub fn bucket_dir(&self, bucket: &VersionBucket) -> Utf8PathBuf {
        self.root.join(bucket.as_str())
    }

    /// Directory an artifact's documentation is extracted into.
    ///
    /// # Examples
    ///
    /// ```
    /// use javadoc_publisher::bucket::VersionBucket;
    /// use javadoc_publisher::layout::PublishLayout;
    ///
    /// let layout = PublishLayout::new("/srv/pages");
    /// let bucket = VersionBucket::for_version("2.5.0");
    /// assert_eq!(layout.artifact_dir(&bucket, "okio"), "/srv/pages/2.x/okio");
    /// ```
    #[must_use]
    pub fn artifact_dir(&self, bucket: &VersionBucket, artifact_id: &str) -> Utf8PathBuf {
        self.bucket_dir(bucket).join(artifact_id)
    }

    /// Directory for `artifact`, bucketed by its latest version.
    #[must_use]
    pub fn dir_for(&self, artifact: &Artifact) -> Utf8PathBuf {
        let bucket = VersionBucket::for_version(artifact.version());
        self.artifact_dir(&bucket, artifact.artifact_id())
    }

    /// Marker file inside an artifact directory.
    #[must_use]
    pub fn marker_path(artifact_dir: &Utf8Path) -> Utf8PathBuf {
        artifact_dir.join(MARKER_FILENAME)
    }

    /// Index page for `bucket`.
    #[must_use]
    pub fn index_path(&self, bucket: &VersionBucket) -> Utf8PathBuf {
        self.bucket_dir(bucket).join(INDEX_FILENAME)
    }

    /// Roster file for `bucket`.
    #[must_use]
    pub fn roster_path(&self, bucket: &VersionBucket) -> Utf8PathBuf {
        self.bucket_dir(bucket).join(ROSTER_FILENAME)
    }

    /// Link from a bucket index page to an artifact's directory.
    #[must_use]
    pub fn index_link(artifact_id: &str) -> String {
        format!("{artifact_id}/")
    }
}
