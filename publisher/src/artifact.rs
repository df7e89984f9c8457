//! Published module identities.
//!
//! An [`Artifact`] is one module of a group as reported by the registry,
//! together with whether the registry holds a Javadoc archive for it.

use std::cmp::Ordering;
use std::fmt;

/// Registry file-extension marker that denotes a Javadoc archive.
pub const JAVADOC_EXTENSION: &str = "-javadoc.jar";

/// One published module considered for documentation publishing.
///
/// Equality and ordering consider only `(group, artifact, version)`; the
/// documentation capability is carried along but does not participate.
#[derive(Debug, Clone)]
pub struct Artifact {
    group_id: String,
    artifact_id: String,
    version: String,
    has_javadoc: bool,
}

impl Artifact {
    /// Creates an artifact that is known to ship a Javadoc archive.
    ///
    /// Used for explicitly named coordinates, where the caller vouches for
    /// the archive.
    ///
    /// # Examples
    ///
    /// ```
    /// use javadoc_publisher::artifact::Artifact;
    ///
    /// let artifact = Artifact::new("com.squareup.okio", "okio", "3.9.0");
    /// assert!(artifact.has_javadoc());
    /// assert_eq!(artifact.to_string(), "com.squareup.okio:okio:3.9.0");
    /// ```
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            has_javadoc: true,
        }
    }

    /// Creates an artifact from a registry listing and the extensions the
    /// registry reports for it.
    #[must_use]
    pub fn from_listing<S: AsRef<str>>(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        extensions: &[S],
    ) -> Self {
        let has_javadoc = extensions
            .iter()
            .any(|extension| extension.as_ref() == JAVADOC_EXTENSION);
        Self {
            has_javadoc,
            ..Self::new(group_id, artifact_id, version)
        }
    }

    /// Returns a copy of this artifact with the documentation capability
    /// overridden.
    #[must_use]
    pub fn with_javadoc(self, has_javadoc: bool) -> Self {
        Self {
            has_javadoc,
            ..self
        }
    }

    /// The group (namespace) identifier.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// The artifact (module) identifier.
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// The latest published version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the registry holds a Javadoc archive for this artifact.
    #[must_use]
    pub const fn has_javadoc(&self) -> bool {
        self.has_javadoc
    }

    fn key(&self) -> (&str, &str, &str) {
        (&self.group_id, &self.artifact_id, &self.version)
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Artifact {}

impl PartialOrd for Artifact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Artifact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl std::hash::Hash for Artifact {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}
