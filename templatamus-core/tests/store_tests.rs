//! Metadata store error-message, atomic-write-safety, and lifecycle tests.
//! Layout: <project>/.templatamus/{metadata.json,sync.json,conflict.patch}

use assert_fs::prelude::*;
use chrono::Utc;
use predicates::prelude::predicate;
use std::fs;
use templatamus_core::{
    store,
    types::{CommitId, CommitInfo, ProjectMetadata, SyncStatus},
    StoreError,
};

fn metadata() -> ProjectMetadata {
    ProjectMetadata::new("acme/web-starter", "main", CommitId::from("a1b2c3d4e5f6"))
}

fn commit(id: &str) -> CommitInfo {
    CommitInfo {
        id: CommitId::from(id),
        message: "Bump dependencies".to_string(),
        author: "Template Bot".to_string(),
        date: Utc::now(),
        url: format!("https://github.com/acme/web-starter/commit/{id}"),
        is_applied: false,
    }
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_metadata_returns_not_found() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    let err = store::load_metadata(project.path()).unwrap_err();
    assert!(matches!(err, StoreError::MetadataNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("no templatamus metadata"));
    assert!(err.to_string().contains("metadata.json"));
}

#[test]
fn load_corrupt_metadata_returns_parse_error_with_path() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    project
        .child(".templatamus/metadata.json")
        .write_str("{ \"source_repo\": ")
        .expect("write");

    let err = store::load_metadata(project.path()).unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("metadata.json"));
}

#[test]
fn load_corrupt_sync_status_is_an_error_not_clean() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    project
        .child(".templatamus/sync.json")
        .write_str("[1, 2, 3]")
        .expect("write");

    let err = store::load_sync_status(project.path()).unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_creates_metadata_dir_and_cleans_tmp() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    store::save_metadata(project.path(), &metadata()).expect("save");

    project
        .child(".templatamus")
        .assert(predicate::path::is_dir());
    project
        .child(".templatamus/metadata.json")
        .assert(predicate::path::is_file());
    project
        .child(".templatamus/metadata.json.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn stale_tmp_from_crash_does_not_affect_load() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    let meta = metadata();
    store::save_metadata(project.path(), &meta).expect("save");

    // Simulate crash: .tmp written but process died before rename
    project
        .child(".templatamus/metadata.json.tmp")
        .write_str("CRASH - INCOMPLETE WRITE")
        .expect("write crash tmp");

    assert_eq!(store::load_metadata(project.path()).expect("load"), meta);

    // The next save replaces the orphan.
    store::save_metadata(project.path(), &meta).expect("save again");
    project
        .child(".templatamus/metadata.json.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn saved_metadata_is_pretty_json_with_stable_keys() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    store::save_metadata(project.path(), &metadata()).expect("save");

    let raw = fs::read_to_string(store::metadata_path(project.path())).expect("read");
    for key in [
        "\"source_repo\"",
        "\"source_branch\"",
        "\"source_commit\"",
        "\"created_at\"",
        "\"last_synced_at\"",
        "\"applied_commits\"",
    ] {
        assert!(raw.contains(key), "missing {key} in:\n{raw}");
    }
    assert!(raw.contains('\n'), "expected pretty-printed JSON");
}

// ---------------------------------------------------------------------------
// 3. Tracking predicate and initial metadata
// ---------------------------------------------------------------------------

#[test]
fn create_initial_metadata_marks_project_tracked() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    assert!(!store::is_tracked_project(project.path()));

    let created = store::create_initial_metadata(
        project.path(),
        "acme/web-starter",
        "main",
        CommitId::from("a1b2c3d4"),
    )
    .expect("create");

    assert!(store::is_tracked_project(project.path()));
    assert_eq!(created.source_commit, CommitId::from("a1b2c3d4"));
    let applied: Vec<_> = created.applied_commits.iter().cloned().collect();
    assert_eq!(applied, vec![CommitId::from("a1b2c3d4")]);
}

#[test]
fn sync_json_directory_is_not_mistaken_for_metadata() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    project
        .child(".templatamus/metadata.json")
        .create_dir_all()
        .expect("mkdir");
    assert!(!store::is_tracked_project(project.path()));
}

// ---------------------------------------------------------------------------
// 4. Conflict record lifecycle
// ---------------------------------------------------------------------------

#[test]
fn conflict_record_lifecycle() {
    let project = assert_fs::TempDir::new().expect("tempdir");
    let c = commit("ffee0011");

    assert!(store::load_sync_status(project.path()).unwrap().is_clean());

    store::save_sync_status(project.path(), &SyncStatus::conflicted(&c, Utc::now()))
        .expect("save status");
    let patch = store::write_conflict_patch(project.path(), b"--- a/x\n+++ b/x\n")
        .expect("write patch");
    project
        .child(".templatamus/sync.json")
        .assert(predicate::path::is_file());
    assert_eq!(patch, store::conflict_patch_path(project.path()));

    let loaded = store::load_sync_status(project.path()).expect("load");
    assert!(!loaded.is_clean());
    assert_eq!(loaded.conflict_commit.as_ref().map(|c| &c.id), Some(&c.id));

    store::clear_sync_status(project.path()).expect("clear");
    store::remove_conflict_patch(project.path()).expect("remove patch");
    project
        .child(".templatamus/sync.json")
        .assert(predicate::path::missing());
    project
        .child(".templatamus/conflict.patch")
        .assert(predicate::path::missing());
    assert!(store::load_sync_status(project.path()).unwrap().is_clean());
}
