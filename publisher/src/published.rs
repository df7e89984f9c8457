//! Artifacts published during one run, grouped by version bucket.

use crate::artifact::Artifact;
use crate::bucket::VersionBucket;
use std::collections::{BTreeMap, BTreeSet};

/// Ordered mapping from bucket to the artifacts published into it.
///
/// Buckets iterate in ascending key order and artifacts within a bucket in
/// identifier order, independent of the order they were recorded in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishedSet {
    by_bucket: BTreeMap<VersionBucket, BTreeSet<Artifact>>,
}

impl PublishedSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `artifact` under the bucket of its version.
    ///
    /// Returns `false` if the same `(group, artifact, version)` was already
    /// recorded.
    pub fn record(&mut self, artifact: Artifact) -> bool {
        let bucket = VersionBucket::for_version(artifact.version());
        self.by_bucket.entry(bucket).or_default().insert(artifact)
    }

    /// Whether `artifact` was already recorded.
    #[must_use]
    pub fn contains(&self, artifact: &Artifact) -> bool {
        self.by_bucket
            .get(&VersionBucket::for_version(artifact.version()))
            .is_some_and(|artifacts| artifacts.contains(artifact))
    }

    /// Whether nothing was published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_bucket.is_empty()
    }

    /// Total number of artifacts across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_bucket.values().map(BTreeSet::len).sum()
    }

    /// Buckets with at least one published artifact, ascending.
    pub fn buckets(&self) -> impl Iterator<Item = &VersionBucket> {
        self.by_bucket.keys()
    }

    /// Artifacts published into `bucket`, in identifier order.
    pub fn artifacts_in(&self, bucket: &VersionBucket) -> impl Iterator<Item = &Artifact> {
        self.by_bucket.get(bucket).into_iter().flatten()
    }

    /// Every `(bucket, artifacts)` pair, ascending by bucket.
    pub fn iter(&self) -> impl Iterator<Item = (&VersionBucket, &BTreeSet<Artifact>)> {
        self.by_bucket.iter()
    }
}
