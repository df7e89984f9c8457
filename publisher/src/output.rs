//! Output for the publisher CLI.
//!
//! Progress and summary lines go to an injected writer so they can be
//! captured in tests. Library diagnostics use the `log` facade; this module
//! also installs the `tracing-subscriber` sink the binary uses for them.

use crate::git::CommitOutcome;
use crate::pipeline::PublishSummary;
use std::fmt::Display;
use std::io::Write;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Writes one line, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; nothing sensible to do on failure.
    }
}

/// Format a success message after publishing.
///
/// # Examples
///
/// ```
/// use javadoc_publisher::output::success_message;
///
/// assert_eq!(
///     success_message(1, "com.squareup.okio", "git@github.com:square/okio.git"),
///     "Published Javadoc for 1 artifact of com.squareup.okio to git@github.com:square/okio.git"
/// );
/// ```
#[must_use]
pub fn success_message(count: usize, group_id: &str, remote_url: &str) -> String {
    let plural = if count == 1 { "artifact" } else { "artifacts" };
    format!("Published Javadoc for {count} {plural} of {group_id} to {remote_url}")
}

/// Writes the end-of-run report for `summary`.
pub fn report_summary(
    stderr: &mut dyn Write,
    summary: &PublishSummary,
    group_id: &str,
    remote_url: &str,
) {
    if matches!(summary.commit, Some(CommitOutcome::DryRun { .. })) {
        write_stderr_line(stderr, "Dry run: nothing was committed or pushed.");
    }
    write_stderr_line(stderr, success_message(summary.count(), group_id, remote_url));
    for (bucket, artifacts) in summary.published.iter() {
        for artifact in artifacts {
            write_stderr_line(stderr, format!("  {bucket}/{}  {artifact}", artifact.artifact_id()));
        }
    }
}

/// Level for this crate's records given the `-v` count and `--quiet` flag.
///
/// # Examples
///
/// ```
/// use javadoc_publisher::output::level_filter;
/// use tracing_subscriber::filter::LevelFilter;
///
/// assert_eq!(level_filter(0, false), LevelFilter::INFO);
/// assert_eq!(level_filter(1, false), LevelFilter::DEBUG);
/// assert_eq!(level_filter(0, true), LevelFilter::ERROR);
/// ```
#[must_use]
pub const fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Per-target filter for the stderr subscriber.
///
/// Debug and trace records are enabled only for this crate; dependencies
/// such as the HTTP client stay at `info` or quieter.
#[must_use]
pub fn log_targets(verbosity: u8, quiet: bool) -> Targets {
    let level = level_filter(verbosity, quiet);
    Targets::new()
        .with_default(level.min(LevelFilter::INFO))
        .with_target(CRATE_TARGET, level)
}

/// Installs the stderr subscriber for `log` records.
///
/// Records emitted through the `log` facade are bridged into the
/// subscriber. Later calls leave the first subscriber in place.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let layer = fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr);
    let subscriber = tracing_subscriber::registry()
        .with(layer)
        .with(log_targets(verbosity, quiet));
    if subscriber.try_init().is_err() {
        // Already installed.
    }
}
