//! On-disk format tests for `templatamus-core` records.
//!
//! Fixtures mimic files written by earlier releases and by hand, so loading
//! stays compatible with what is already checked into generated projects.

use chrono::{TimeZone, Utc};
use rstest::rstest;
use templatamus_core::types::{CommitId, ProjectMetadata, SyncStatus};

const METADATA_WITH_NANOS: &str = r#"{
  "source_repo": "acme/web-starter",
  "source_branch": "main",
  "source_commit": "c1",
  "created_at": "2024-03-01T10:15:30.123456789+01:00",
  "last_synced_at": "2024-03-02T08:00:00Z",
  "applied_commits": ["c1", "c2"]
}"#;

const METADATA_NULL_APPLIED_MISSING: &str = r#"{
  "source_repo": "acme/web-starter",
  "source_branch": "develop",
  "source_commit": "c1",
  "created_at": "2024-03-01T10:15:30Z",
  "last_synced_at": "2024-03-01T10:15:30Z"
}"#;

const METADATA_DUPLICATES: &str = r#"{
  "source_repo": "acme/web-starter",
  "source_branch": "main",
  "source_commit": "c1",
  "created_at": "2024-03-01T10:15:30Z",
  "last_synced_at": "2024-03-01T10:15:30Z",
  "applied_commits": ["c1", "c2", "c2", "c1", "c3"]
}"#;

#[rstest]
#[case("offset_and_nanos", METADATA_WITH_NANOS, &["c1", "c2"])]
#[case("applied_missing", METADATA_NULL_APPLIED_MISSING, &[])]
#[case("duplicates_collapsed", METADATA_DUPLICATES, &["c1", "c2", "c3"])]
fn metadata_fixture_loads(#[case] label: &str, #[case] raw: &str, #[case] applied: &[&str]) {
    let meta: ProjectMetadata =
        serde_json::from_str(raw).unwrap_or_else(|e| panic!("[{label}] parse failed: {e}"));
    let got: Vec<_> = meta.applied_commits.iter().map(CommitId::as_str).collect();
    assert_eq!(got, applied, "[{label}] applied order");
    assert_eq!(meta.repo_slug().expect("slug").name, "web-starter", "[{label}]");
}

#[test]
fn offset_timestamps_normalise_to_utc() {
    let meta: ProjectMetadata = serde_json::from_str(METADATA_WITH_NANOS).unwrap();
    let expected = Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 30).unwrap();
    assert_eq!(meta.created_at.timestamp(), expected.timestamp());
}

#[rstest]
#[case("empty_object", "{}")]
#[case(
    "legacy_zero_values",
    r#"{"in_progress":false,"current_commit":"","has_conflicts":false,"conflicts_at":"0001-01-01T00:00:00Z"}"#
)]
fn clean_sync_status_fixtures(#[case] label: &str, #[case] raw: &str) {
    let status: SyncStatus =
        serde_json::from_str(raw).unwrap_or_else(|e| panic!("[{label}] parse failed: {e}"));
    assert!(status.is_clean(), "[{label}] should be clean");
    assert!(status.conflict_commit.is_none(), "[{label}]");
}

#[test]
fn conflicted_sync_status_fixture() {
    let raw = r#"{
      "in_progress": true,
      "current_commit": "c9",
      "has_conflicts": true,
      "conflicts_at": "2024-05-05T12:00:00Z",
      "conflict_commit": {
        "sha": "c9",
        "message": "Rework navbar\n\nMoves items around",
        "author": "Jane Doe",
        "date": "2024-05-04T09:30:00Z",
        "url": "https://github.com/acme/web-starter/commit/c9"
      }
    }"#;
    let status: SyncStatus = serde_json::from_str(raw).expect("parse");
    assert!(!status.is_clean());
    let commit = status.conflict_commit.expect("conflict commit");
    assert_eq!(commit.id, CommitId::from("c9"));
    assert_eq!(commit.summary(), "Rework navbar");
    assert!(!commit.is_applied);
}
