//! Per-bucket index pages.
//!
//! Each bucket directory carries a roster (`artifacts.json`) recording every
//! artifact ever published into it and the version last written. A rebuild
//! merges the current run into the roster and regenerates `index.html` from
//! the full roster, so an artifact published in an earlier run stays listed
//! when a later run touches only its neighbours.
//!
//! Version markers stay authoritative: every candidate of the run that
//! already has a marker in a touched bucket is recorded with the marker's
//! version. A working copy published before rosters existed is picked up
//! this way without listing directories.

use crate::artifact::Artifact;
use crate::bucket::VersionBucket;
use crate::layout::PublishLayout;
use crate::marker::read_marker;
use crate::published::PublishedSet;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;

/// Errors arising while regenerating index pages.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A roster or index file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The file involved.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A roster file exists but is not valid.
    #[error("invalid roster {path}: {source}")]
    Roster {
        /// The roster file.
        path: Utf8PathBuf,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// Durable list of the artifacts published into one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    artifacts: BTreeMap<String, String>,
}

impl Roster {
    /// Loads the roster at `path`; a missing file is an empty roster.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the file exists but cannot be read or
    /// decoded.
    pub fn load(path: &Utf8Path) -> Result<Self, IndexError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(IndexError::Io {
                    path: path.to_owned(),
                    source,
                });
            }
        };
        serde_json::from_str(&contents).map_err(|source| IndexError::Roster {
            path: path.to_owned(),
            source,
        })
    }

    /// Writes the roster to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Utf8Path) -> Result<(), IndexError> {
        let mut json = serde_json::to_string_pretty(self).map_err(|source| IndexError::Roster {
            path: path.to_owned(),
            source,
        })?;
        json.push('\n');
        write_file(path, &json)
    }

    /// Records that `artifact_id` was published at `version`.
    pub fn record(&mut self, artifact_id: &str, version: &str) {
        self.artifacts.insert(artifact_id.to_owned(), version.to_owned());
    }

    /// Published artifacts as `(artifact_id, version)`, by identifier.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.artifacts
            .iter()
            .map(|(id, version)| (id.as_str(), version.as_str()))
    }

    /// Number of artifacts in the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Regenerates index pages under a publish root.
#[derive(Debug, Clone, Copy)]
pub struct IndexBuilder<'a> {
    layout: &'a PublishLayout,
}

impl<'a> IndexBuilder<'a> {
    /// Creates a builder writing into `layout`.
    #[must_use]
    pub const fn new(layout: &'a PublishLayout) -> Self {
        Self { layout }
    }

    /// Rewrites the roster and `index.html` of every bucket in `published`.
    ///
    /// `candidates` are all artifacts the run considered. Those in a touched
    /// bucket that carry a marker are recorded at the marker's version before
    /// this run's publishes are merged. Buckets without a publish this run
    /// are left untouched. Returns the files written, for staging.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if a roster cannot be read or a file cannot be
    /// written.
    pub fn rebuild(
        &self,
        group_id: &str,
        published: &PublishedSet,
        candidates: &[Artifact],
    ) -> Result<Vec<Utf8PathBuf>, IndexError> {
        let mut written = Vec::new();
        for (bucket, artifacts) in published.iter() {
            let roster_path = self.layout.roster_path(bucket);
            let mut roster = Roster::load(&roster_path)?;
            self.record_markers(&mut roster, bucket, candidates);
            for artifact in artifacts {
                roster.record(artifact.artifact_id(), artifact.version());
            }
            roster.save(&roster_path)?;

            let index_path = self.layout.index_path(bucket);
            write_file(&index_path, &render_index(group_id, bucket, &roster))?;
            debug!("wrote {index_path} listing {} artifact(s)", roster.len());

            written.push(index_path);
            written.push(roster_path);
        }
        Ok(written)
    }

    fn record_markers(&self, roster: &mut Roster, bucket: &VersionBucket, candidates: &[Artifact]) {
        let in_bucket = candidates
            .iter()
            .filter(|artifact| VersionBucket::for_version(artifact.version()) == *bucket);
        for artifact in in_bucket {
            let artifact_dir = self.layout.dir_for(artifact);
            match read_marker(&artifact_dir) {
                Ok(Some(version)) => roster.record(artifact.artifact_id(), &version),
                Ok(None) => {}
                Err(e) => warn!("Ignoring unreadable marker in {artifact_dir}: {e}"),
            }
        }
    }
}

/// Renders the index page for one bucket.
///
/// # Examples
///
/// ```
/// use javadoc_publisher::bucket::VersionBucket;
/// use javadoc_publisher::index::{Roster, render_index};
///
/// let mut roster = Roster::default();
/// roster.record("okio", "3.9.0");
/// let html = render_index("com.squareup.okio", &VersionBucket::for_version("3.9.0"), &roster);
/// assert!(html.contains("<a href=\"okio/\">okio</a>"));
/// ```
#[must_use]
pub fn render_index(group_id: &str, bucket: &VersionBucket, roster: &Roster) -> String {
    let group = escape_html(group_id);
    let mut html = format!(
        "<!DOCTYPE html>\n<html><head><title>{group}</title></head>\n<body>\n\
         <h1>{group}</h1>\n<p>Version {}</p>\n<ul>\n",
        escape_html(bucket.as_str())
    );
    for (artifact_id, _version) in roster.entries() {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(&PublishLayout::index_link(artifact_id)),
            escape_html(artifact_id)
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<(), IndexError> {
    let io_error = |source| IndexError::Io {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, contents).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::write_marker;
    use rstest::{fixture, rstest};

    struct Root {
        _temp: tempfile::TempDir,
        layout: PublishLayout,
    }

    #[fixture]
    fn root() -> Root {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        Root {
            _temp: temp,
            layout: PublishLayout::new(path),
        }
    }

    fn published(artifacts: &[(&str, &str)]) -> PublishedSet {
        let mut set = PublishedSet::new();
        for (id, version) in artifacts {
            set.record(Artifact::new("com.example", *id, *version));
        }
        set
    }

    fn listed_ids(html: &str) -> Vec<String> {
        html.lines()
            .filter_map(|line| line.strip_prefix("<li><a href=\""))
            .filter_map(|rest| rest.split_once('"').map(|(href, _)| href.to_owned()))
            .collect()
    }

    #[rstest]
    fn writes_one_index_per_bucket(root: Root) {
        let set = published(&[("beta", "2.0.0"), ("alpha", "1.0.0")]);

        let written = IndexBuilder::new(&root.layout)
            .rebuild("com.example", &set, &[])
            .expect("rebuild");

        let one = fs::read_to_string(root.layout.root().join("1.x/index.html")).expect("1.x");
        let two = fs::read_to_string(root.layout.root().join("2.x/index.html")).expect("2.x");
        assert_eq!(listed_ids(&one), vec!["alpha/"]);
        assert_eq!(listed_ids(&two), vec!["beta/"]);
        assert_eq!(written.len(), 4);
    }

    #[rstest]
    fn artifacts_are_sorted_by_identifier(root: Root) {
        let set = published(&[("zeta", "2.0.0"), ("alpha", "2.1.0"), ("mid", "2.0.1")]);

        IndexBuilder::new(&root.layout)
            .rebuild("com.example", &set, &[])
            .expect("rebuild");

        let html = fs::read_to_string(root.layout.root().join("2.x/index.html")).expect("index");
        assert_eq!(listed_ids(&html), vec!["alpha/", "mid/", "zeta/"]);
    }

    #[rstest]
    fn earlier_publishes_stay_listed(root: Root) {
        let builder = IndexBuilder::new(&root.layout);
        builder
            .rebuild(
                "com.example",
                &published(&[("alpha", "2.0.0"), ("beta", "2.0.0")]),
                &[],
            )
            .expect("first run");
        builder
            .rebuild("com.example", &published(&[("beta", "2.1.0")]), &[])
            .expect("second run");

        let html = fs::read_to_string(root.layout.root().join("2.x/index.html")).expect("index");
        assert_eq!(listed_ids(&html), vec!["alpha/", "beta/"]);

        let roster_path = root.layout.roster_path(&VersionBucket::for_version("2.0"));
        let roster = Roster::load(&roster_path).expect("roster");
        let entries: Vec<(&str, &str)> = roster.entries().collect();
        assert_eq!(entries, vec![("alpha", "2.0.0"), ("beta", "2.1.0")]);
    }

    #[rstest]
    fn marked_candidates_are_listed_without_a_roster(root: Root) {
        let existing = Artifact::new("com.example", "fakefilesystem", "3.9.0");
        let existing_dir = root.layout.dir_for(&existing);
        fs::create_dir_all(&existing_dir).expect("artifact dir");
        write_marker(&existing_dir, "3.9.0").expect("marker");
        let unpublished = Artifact::new("com.example", "never", "3.0.0");
        let other_bucket = Artifact::new("com.example", "legacy", "2.0.0");
        let other_dir = root.layout.dir_for(&other_bucket);
        fs::create_dir_all(&other_dir).expect("artifact dir");
        write_marker(&other_dir, "2.0.0").expect("marker");

        IndexBuilder::new(&root.layout)
            .rebuild(
                "com.example",
                &published(&[("okio", "3.9.0")]),
                &[existing, unpublished, other_bucket],
            )
            .expect("rebuild");

        let html = fs::read_to_string(root.layout.root().join("3.x/index.html")).expect("index");
        assert_eq!(listed_ids(&html), vec!["fakefilesystem/", "okio/"]);
        assert!(!root.layout.root().join("2.x/index.html").exists());
    }

    #[rstest]
    fn roster_takes_the_marker_version(root: Root) {
        let bucket = VersionBucket::for_version("1.0");
        let mut stale = Roster::default();
        stale.record("alpha", "1.0");
        stale.save(&root.layout.roster_path(&bucket)).expect("roster");
        let alpha = Artifact::new("com.example", "alpha", "1.2");
        let alpha_dir = root.layout.dir_for(&alpha);
        fs::create_dir_all(&alpha_dir).expect("artifact dir");
        write_marker(&alpha_dir, "1.1").expect("marker");

        IndexBuilder::new(&root.layout)
            .rebuild("com.example", &published(&[("beta", "1.0")]), &[alpha])
            .expect("rebuild");

        let roster = Roster::load(&root.layout.roster_path(&bucket)).expect("roster");
        let entries: Vec<(&str, &str)> = roster.entries().collect();
        assert_eq!(entries, vec![("alpha", "1.1"), ("beta", "1.0")]);
    }

    #[rstest]
    fn empty_set_writes_nothing(root: Root) {
        let written = IndexBuilder::new(&root.layout)
            .rebuild("com.example", &PublishedSet::new(), &[])
            .expect("rebuild");
        assert!(written.is_empty());
        assert!(fs::read_dir(root.layout.root()).expect("read root").next().is_none());
    }

    #[rstest]
    fn corrupt_roster_is_reported(root: Root) {
        let bucket = VersionBucket::for_version("1.0");
        fs::create_dir_all(root.layout.bucket_dir(&bucket)).expect("bucket dir");
        fs::write(root.layout.roster_path(&bucket), "not json").expect("corrupt roster");

        let result = IndexBuilder::new(&root.layout).rebuild(
            "com.example",
            &published(&[("alpha", "1.0")]),
            &[],
        );

        assert!(matches!(result, Err(IndexError::Roster { .. })));
    }

    #[test]
    fn markup_is_escaped() {
        let mut roster = Roster::default();
        roster.record("a<b", "1.0");
        let html = render_index("g&co", &VersionBucket::for_version("1.0"), &roster);
        assert!(html.contains("<title>g&amp;co</title>"));
        assert!(html.contains("<a href=\"a&lt;b/\">a&lt;b</a>"));
    }
}
