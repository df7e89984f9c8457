//! Unit tests for the publishing pipeline.
//!
//! Runs use a temp-dir working copy, the recording `StubExecutor` in place of
//! git, and either the scripted `StubRegistry` or a `MockRegistry` where the
//! test must prove a call never happens.

use super::{COMMIT_TITLE, CommitMessage, PublishPipeline, PublishSummary, PublishTarget};
use crate::artifact::Artifact;
use crate::decision::PublishDecision;
use crate::error::PublishError;
use crate::extraction::ZipExtractor;
use crate::git::{CommitOutcome, RepositorySync, SyncSettings};
use crate::marker::read_marker;
use crate::registry::{FetchError, MockRegistry, Registry};
use crate::test_utils::{StubExecutor, StubRegistry, javadoc_archive};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::{fixture, rstest};
use std::fs;

const REMOTE: &str = "git@example.com:square/okio.git";
const GROUP: &str = "com.squareup.okio";

/// Temp directory holding an existing working copy at `<temp>/pages`.
struct WorkingCopy {
    _temp: tempfile::TempDir,
    path: Utf8PathBuf,
}

#[fixture]
fn working_copy() -> WorkingCopy {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    let path = root.join("pages");
    fs::create_dir_all(&path).expect("working copy");
    WorkingCopy { _temp: temp, path }
}

fn artifact(id: &str, version: &str) -> Artifact {
    Artifact::new(GROUP, id, version)
}

fn registry_serving(listing: &[Artifact]) -> StubRegistry {
    let mut registry = StubRegistry::new();
    for artifact in listing {
        registry.set_archive(artifact, javadoc_archive(artifact));
    }
    registry.set_listing(listing.to_vec());
    registry
}

fn run_with(
    registry: &dyn Registry,
    executor: &StubExecutor,
    working_copy: &Utf8Path,
    settings: SyncSettings,
    force: bool,
) -> Result<PublishSummary, PublishError> {
    let sync = RepositorySync::new(executor, working_copy, settings);
    PublishPipeline::new(registry, &ZipExtractor, &sync, PublishDecision::new(force))
        .publish_latest(REMOTE, GROUP)
}

fn run_default(
    registry: &dyn Registry,
    executor: &StubExecutor,
    working_copy: &Utf8Path,
) -> Result<PublishSummary, PublishError> {
    run_with(registry, executor, working_copy, SyncSettings::default(), false)
}

fn commit_message(executor: &StubExecutor) -> String {
    let commits = executor.git_calls("commit");
    assert_eq!(commits.len(), 1, "expected exactly one commit");
    commits[0].arguments()[2].clone()
}

#[rstest]
fn publishes_listing_into_buckets(working_copy: WorkingCopy) {
    let registry = registry_serving(&[artifact("okio", "3.9.0"), artifact("moshi", "1.15.0")]);
    let executor = StubExecutor::new();

    let summary = run_default(&registry, &executor, &working_copy.path).expect("run");

    assert_eq!(summary.count(), 2);
    assert_eq!(summary.commit, Some(CommitOutcome::Pushed));
    for (dir, version) in [("3.x/okio", "3.9.0"), ("1.x/moshi", "1.15.0")] {
        let artifact_dir = working_copy.path.join(dir);
        assert!(artifact_dir.join("index.html").is_file(), "{dir} extracted");
        assert_eq!(
            read_marker(&artifact_dir).expect("marker"),
            Some(version.to_owned())
        );
    }
    assert!(working_copy.path.join("3.x/index.html").is_file());
    assert!(working_copy.path.join("1.x/index.html").is_file());
    assert_eq!(
        executor.git_subcommands(),
        vec!["pull", "add", "add", "add", "add", "add", "add", "commit", "push"]
    );
}

#[rstest]
fn second_run_without_registry_changes_publishes_nothing(working_copy: WorkingCopy) {
    let registry = registry_serving(&[artifact("okio", "3.9.0"), artifact("moshi", "1.15.0")]);
    run_default(&registry, &StubExecutor::new(), &working_copy.path).expect("first run");

    let executor = StubExecutor::new();
    let summary = run_default(&registry, &executor, &working_copy.path).expect("second run");

    assert_eq!(summary.count(), 0);
    assert_eq!(summary.commit, None);
    assert_eq!(executor.git_subcommands(), vec!["pull"]);
    assert_eq!(registry.downloads().len(), 2, "no downloads on second run");
}

#[rstest]
fn new_version_overwrites_marker(working_copy: WorkingCopy) {
    let first = registry_serving(&[artifact("okio", "3.9.0")]);
    run_default(&first, &StubExecutor::new(), &working_copy.path).expect("first run");

    let second = registry_serving(&[artifact("okio", "3.10.0")]);
    let summary =
        run_default(&second, &StubExecutor::new(), &working_copy.path).expect("second run");

    assert_eq!(summary.count(), 1);
    assert_eq!(
        read_marker(&working_copy.path.join("3.x/okio")).expect("marker"),
        Some("3.10.0".to_owned())
    );
}

#[rstest]
fn commit_message_lists_artifacts_in_processing_order(working_copy: WorkingCopy) {
    let registry = registry_serving(&[
        artifact("okio", "3.9.0"),
        artifact("moshi", "1.15.0"),
        artifact("okhttp", "4.12.0"),
    ]);
    let executor = StubExecutor::new();

    run_default(&registry, &executor, &working_copy.path).expect("run");

    assert_eq!(
        commit_message(&executor),
        format!(
            "{COMMIT_TITLE}\n\n\
             com.squareup.okio:okio:3.9.0\n\
             com.squareup.okio:moshi:1.15.0\n\
             com.squareup.okio:okhttp:4.12.0"
        )
    );
}

#[rstest]
fn artifacts_without_javadoc_are_never_fetched(working_copy: WorkingCopy) {
    let mut registry = MockRegistry::new();
    registry.expect_latest_artifacts().times(1).returning(|_| {
        Ok(vec![
            Artifact::new(GROUP, "okio-bom", "3.9.0").with_javadoc(false),
        ])
    });
    registry.expect_download_doc_archive().never();
    let executor = StubExecutor::new();

    let summary = run_default(&registry, &executor, &working_copy.path).expect("run");

    assert_eq!(summary.count(), 0);
    assert!(!working_copy.path.join("3.x/okio-bom").exists());
    assert_eq!(executor.git_subcommands(), vec!["pull"]);
}

#[rstest]
fn dry_run_writes_everything_but_never_commits(working_copy: WorkingCopy) {
    let registry = registry_serving(&[artifact("okio", "3.9.0")]);
    let executor = StubExecutor::new();
    let settings = SyncSettings {
        dry_run: true,
        ..SyncSettings::default()
    };

    let summary =
        run_with(&registry, &executor, &working_copy.path, settings, false).expect("dry run");

    assert!(matches!(summary.commit, Some(CommitOutcome::DryRun { .. })));
    assert!(working_copy.path.join("3.x/okio/version.txt").is_file());
    assert!(working_copy.path.join("3.x/index.html").is_file());
    let subcommands = executor.git_subcommands();
    assert!(subcommands.iter().any(|name| name == "add"));
    assert!(!subcommands.iter().any(|name| name == "commit" || name == "push"));
}

#[rstest]
fn force_republishes_up_to_date_artifacts(working_copy: WorkingCopy) {
    let registry = registry_serving(&[artifact("okio", "3.9.0")]);
    run_default(&registry, &StubExecutor::new(), &working_copy.path).expect("first run");

    let summary = run_with(
        &registry,
        &StubExecutor::new(),
        &working_copy.path,
        SyncSettings::default(),
        true,
    )
    .expect("forced run");

    assert_eq!(summary.count(), 1);
    assert_eq!(registry.downloads().len(), 2);
}

#[rstest]
fn failed_download_aborts_before_commit(working_copy: WorkingCopy) {
    let mut registry = registry_serving(&[artifact("okio", "3.9.0")]);
    registry.set_listing(vec![artifact("okio", "3.9.0"), artifact("missing", "1.0")]);
    let executor = StubExecutor::new();

    let err = run_default(&registry, &executor, &working_copy.path).expect_err("should fail");

    assert!(
        matches!(err, PublishError::Fetch(FetchError::Status { status: 404, .. })),
        "unexpected error: {err}"
    );
    assert!(executor.git_calls("commit").is_empty());
    assert!(
        working_copy.path.join("3.x/okio/version.txt").is_file(),
        "earlier artifacts stay written"
    );
}

#[rstest]
fn corrupt_archive_names_the_artifact(working_copy: WorkingCopy) {
    let okio = artifact("okio", "3.9.0");
    let mut registry = StubRegistry::new();
    registry.set_archive(&okio, b"not a zip".to_vec());
    registry.set_listing(vec![okio]);

    let err = run_default(&registry, &StubExecutor::new(), &working_copy.path)
        .expect_err("should fail");

    match err {
        PublishError::Extraction { artifact, .. } => {
            assert_eq!(artifact, "com.squareup.okio:okio:3.9.0");
        }
        other => panic!("expected extraction error, got {other}"),
    }
    assert!(!working_copy.path.join("3.x/okio/version.txt").exists());
}

#[rstest]
fn failed_push_is_a_sync_error(working_copy: WorkingCopy) {
    let registry = registry_serving(&[artifact("okio", "3.9.0")]);
    let executor = StubExecutor::new().failing_on("push", "rejected: non-fast-forward");

    let err = run_default(&registry, &executor, &working_copy.path).expect_err("should fail");

    assert!(matches!(err, PublishError::Sync(_)));
    assert!(err.to_string().contains("non-fast-forward"));
}

#[rstest]
fn failed_listing_never_touches_working_copy(working_copy: WorkingCopy) {
    let mut registry = MockRegistry::new();
    registry.expect_latest_artifacts().returning(|_| {
        Err(FetchError::Http {
            url: "https://search.example".to_owned(),
            reason: "connection refused".to_owned(),
        })
    });
    let executor = StubExecutor::new();

    let err = run_default(&registry, &executor, &working_copy.path).expect_err("should fail");

    assert!(matches!(err, PublishError::Fetch(FetchError::Http { .. })));
    assert!(executor.calls().is_empty());
}

#[rstest]
fn explicit_target_publishes_named_version(working_copy: WorkingCopy) {
    let okio = artifact("okio", "2.10.0");
    let registry = registry_serving(&[okio]);
    let executor = StubExecutor::new();
    let sync = RepositorySync::new(&executor, &working_copy.path, SyncSettings::default());
    let pipeline =
        PublishPipeline::new(&registry, &ZipExtractor, &sync, PublishDecision::default());
    let target = PublishTarget::Explicit {
        artifact_id: "okio".to_owned(),
        version: "2.10.0".to_owned(),
    };

    let summary = pipeline.publish_target(REMOTE, GROUP, &target).expect("run");

    assert_eq!(summary.count(), 1);
    assert_eq!(
        read_marker(&working_copy.path.join("2.x/okio")).expect("marker"),
        Some("2.10.0".to_owned())
    );
}

#[rstest]
fn absent_working_copy_is_cloned_first(working_copy: WorkingCopy) {
    let fresh = working_copy.path.with_file_name("fresh");
    let registry = registry_serving(&[artifact("okio", "3.9.0")]);
    let executor = StubExecutor::new();

    run_default(&registry, &executor, &fresh).expect("run");

    assert_eq!(executor.git_subcommands().first().map(String::as_str), Some("clone"));
    assert!(fresh.join("3.x/okio/version.txt").is_file());
}

#[rstest]
fn subset_run_keeps_earlier_artifacts_in_index(working_copy: WorkingCopy) {
    let both = registry_serving(&[
        artifact("okio", "3.9.0"),
        artifact("okio-fakefilesystem", "3.9.0"),
    ]);
    run_default(&both, &StubExecutor::new(), &working_copy.path).expect("first run");

    let one = registry_serving(&[
        artifact("okio", "3.9.1"),
        artifact("okio-fakefilesystem", "3.9.0"),
    ]);
    let summary = run_default(&one, &StubExecutor::new(), &working_copy.path).expect("second run");

    assert_eq!(summary.count(), 1);
    let index = fs::read_to_string(working_copy.path.join("3.x/index.html")).expect("index");
    assert!(index.contains("href=\"okio/\""));
    assert!(index.contains("href=\"okio-fakefilesystem/\""));
}

#[rstest]
fn markers_from_before_rosters_stay_in_index(working_copy: WorkingCopy) {
    let marked_dir = working_copy.path.join("3.x/okio-fakefilesystem");
    fs::create_dir_all(&marked_dir).expect("artifact dir");
    fs::write(marked_dir.join("version.txt"), "3.9.0").expect("marker");
    let registry = registry_serving(&[
        artifact("okio", "3.9.0"),
        artifact("okio-fakefilesystem", "3.9.0"),
    ]);

    let summary = run_default(&registry, &StubExecutor::new(), &working_copy.path).expect("run");

    assert_eq!(summary.count(), 1);
    assert_eq!(registry.downloads(), vec!["com.squareup.okio:okio:3.9.0"]);
    let index = fs::read_to_string(working_copy.path.join("3.x/index.html")).expect("index");
    assert!(index.contains("<li><a href=\"okio/\">okio</a></li>"));
    assert!(index.contains("<li><a href=\"okio-fakefilesystem/\">okio-fakefilesystem</a></li>"));
}

#[rstest]
fn repeated_coordinate_is_published_once(working_copy: WorkingCopy) {
    let okio = artifact("okio", "3.9.0");
    let mut registry = registry_serving(&[okio.clone()]);
    registry.set_listing(vec![okio.clone(), okio]);
    let executor = StubExecutor::new();

    let summary = run_with(
        &registry,
        &executor,
        &working_copy.path,
        SyncSettings::default(),
        true,
    )
    .expect("forced run");

    assert_eq!(summary.count(), 1);
    assert_eq!(registry.downloads().len(), 1);
    assert_eq!(
        commit_message(&executor),
        format!("{COMMIT_TITLE}\n\ncom.squareup.okio:okio:3.9.0")
    );
}

#[test]
fn empty_commit_message_is_title_only() {
    let message = CommitMessage::new();
    assert!(message.is_empty());
    assert_eq!(message.to_string(), format!("{COMMIT_TITLE}\n"));
}
