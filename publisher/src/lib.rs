//! Javadoc publisher library.
//!
//! This crate downloads Javadoc archives for the modules of a Maven group,
//! extracts them into a working copy of a static-hosting git branch and
//! pushes the result. It is used by the `javadoc-publisher` CLI binary and
//! can be driven programmatically through [`pipeline::PublishPipeline`].
//!
//! # Modules
//!
//! - [`artifact`] - Published module identities
//! - [`bucket`] - Major-version buckets for directory partitioning
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration and its resolution order
//! - [`decision`] - Marker-based publish decisions
//! - [`error`] - Top-level error type
//! - [`extraction`] - Zip archive extraction
//! - [`git`] - Working copy sync, staging, commit and push
//! - [`index`] - Per-bucket index pages and rosters
//! - [`layout`] - Paths within the publish root
//! - [`marker`] - Version marker files
//! - [`output`] - Progress output and the stderr log sink
//! - [`pipeline`] - Publishing run orchestration
//! - [`process`] - Subprocess execution with timeouts
//! - [`published`] - Artifacts published in one run, by bucket
//! - [`registry`] - Registry access and the Maven Central client

pub mod artifact;
pub mod bucket;
pub mod cli;
pub mod config;
pub mod decision;
pub mod error;
pub mod extraction;
pub mod git;
pub mod index;
pub mod layout;
pub mod marker;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod published;
pub mod registry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
