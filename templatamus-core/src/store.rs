//! Per-project metadata store.
//!
//! # Storage layout
//!
//! ```text
//! <project>/
//!   .templatamus/
//!     metadata.json    (provenance and applied commits; present once tracked)
//!     sync.json        (open conflict record; present only while a conflict is open)
//!     conflict.patch   (diff of the conflicting commit; same lifetime as sync.json)
//! ```
//!
//! Absence of `sync.json` is the canonical "no sync in progress" signal:
//! [`load_sync_status`] returns a default status instead of an error.
//!
//! Writes use the `.tmp` sibling + `rename` pattern so readers never observe a
//! half-written record. There is no file locking; two processes syncing the
//! same project directory at once is undefined behavior.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{io_err, StoreError};
use crate::types::{CommitId, ProjectMetadata, SyncStatus};

pub const METADATA_DIR: &str = ".templatamus";
pub const METADATA_FILE: &str = "metadata.json";
pub const SYNC_FILE: &str = "sync.json";
pub const CONFLICT_PATCH_FILE: &str = "conflict.patch";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<dir>/.templatamus/`. Pure, no I/O.
pub fn metadata_dir(dir: &Path) -> PathBuf {
    dir.join(METADATA_DIR)
}

/// `<dir>/.templatamus/metadata.json`
pub fn metadata_path(dir: &Path) -> PathBuf {
    metadata_dir(dir).join(METADATA_FILE)
}

/// `<dir>/.templatamus/sync.json`
pub fn sync_status_path(dir: &Path) -> PathBuf {
    metadata_dir(dir).join(SYNC_FILE)
}

/// `<dir>/.templatamus/conflict.patch`
pub fn conflict_patch_path(dir: &Path) -> PathBuf {
    metadata_dir(dir).join(CONFLICT_PATCH_FILE)
}

/// Whether `dir` is a tracked templatamus project.
pub fn is_tracked_project(dir: &Path) -> bool {
    metadata_path(dir).is_file()
}

// ---------------------------------------------------------------------------
// 2. Project metadata
// ---------------------------------------------------------------------------

/// Load `<dir>/.templatamus/metadata.json`.
///
/// Returns `StoreError::MetadataNotFound` if absent and `StoreError::Parse`
/// (with path) if malformed.
pub fn load_metadata(dir: &Path) -> Result<ProjectMetadata, StoreError> {
    let path = metadata_path(dir);
    match read_json(&path)? {
        Some(metadata) => Ok(metadata),
        None => Err(StoreError::MetadataNotFound { path }),
    }
}

/// Atomically write `<dir>/.templatamus/metadata.json`.
pub fn save_metadata(dir: &Path, metadata: &ProjectMetadata) -> Result<(), StoreError> {
    write_json_atomic(&metadata_path(dir), metadata)
}

/// Record a freshly adopted project generated from `commit` and persist it.
pub fn create_initial_metadata(
    dir: &Path,
    repo: &str,
    branch: &str,
    commit: CommitId,
) -> Result<ProjectMetadata, StoreError> {
    let metadata = ProjectMetadata::new(repo, branch, commit);
    metadata.repo_slug()?;
    save_metadata(dir, &metadata)?;
    Ok(metadata)
}

// ---------------------------------------------------------------------------
// 3. Sync status
// ---------------------------------------------------------------------------

/// Load the open conflict record; a missing file yields a clean default.
pub fn load_sync_status(dir: &Path) -> Result<SyncStatus, StoreError> {
    Ok(read_json(&sync_status_path(dir))?.unwrap_or_default())
}

/// Atomically write `<dir>/.templatamus/sync.json`.
pub fn save_sync_status(dir: &Path, status: &SyncStatus) -> Result<(), StoreError> {
    write_json_atomic(&sync_status_path(dir), status)
}

/// Remove `sync.json`. Succeeds if it is already gone.
pub fn clear_sync_status(dir: &Path) -> Result<(), StoreError> {
    remove_if_exists(&sync_status_path(dir))
}

// ---------------------------------------------------------------------------
// 4. Conflict patch artifact
// ---------------------------------------------------------------------------

/// Save the diff of a conflicting commit for manual resolution.
pub fn write_conflict_patch(dir: &Path, diff: &[u8]) -> Result<PathBuf, StoreError> {
    let path = conflict_patch_path(dir);
    let parent = metadata_dir(dir);
    std::fs::create_dir_all(&parent).map_err(|e| io_err(&parent, e))?;
    std::fs::write(&path, diff).map_err(|e| io_err(&path, e))?;
    Ok(path)
}

/// Remove the saved conflict patch. Succeeds if it is already gone.
pub fn remove_conflict_patch(dir: &Path) -> Result<(), StoreError> {
    remove_if_exists(&conflict_patch_path(dir))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize → `<file>.tmp` sibling → `rename`. The `.tmp` lives in the same
/// directory as the target so the rename never crosses filesystems.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid metadata path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path, e)),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::types::CommitInfo;

    fn sample_metadata() -> ProjectMetadata {
        ProjectMetadata::new("acme/starter", "main", CommitId::from("c1"))
    }

    fn sample_commit(id: &str) -> CommitInfo {
        CommitInfo {
            id: CommitId::from(id),
            message: "Tweak layout\n\nDetails".to_string(),
            author: "dev".to_string(),
            date: Utc::now(),
            url: format!("https://github.com/acme/starter/commit/{id}"),
            is_applied: false,
        }
    }

    #[test]
    fn paths_are_under_metadata_dir() {
        let dir = Path::new("/work/app");
        assert!(metadata_path(dir).ends_with(".templatamus/metadata.json"));
        assert!(sync_status_path(dir).ends_with(".templatamus/sync.json"));
        assert!(conflict_patch_path(dir).ends_with(".templatamus/conflict.patch"));
    }

    #[test]
    fn untracked_dir_is_not_a_project() {
        let tmp = TempDir::new().unwrap();
        assert!(!is_tracked_project(tmp.path()));
        let err = load_metadata(tmp.path()).unwrap_err();
        assert!(matches!(err, StoreError::MetadataNotFound { .. }));
    }

    #[test]
    fn save_creates_dir_and_roundtrips() {
        let tmp = TempDir::new().unwrap();
        let meta = sample_metadata();
        save_metadata(tmp.path(), &meta).unwrap();
        assert!(is_tracked_project(tmp.path()));
        assert_eq!(load_metadata(tmp.path()).unwrap(), meta);
    }

    #[test]
    fn atomic_write_cleans_up_tmp() {
        let tmp = TempDir::new().unwrap();
        save_metadata(tmp.path(), &sample_metadata()).unwrap();
        let leftover = metadata_path(tmp.path()).with_extension("json.tmp");
        assert!(!leftover.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn create_initial_metadata_rejects_bad_repo() {
        let tmp = TempDir::new().unwrap();
        let err =
            create_initial_metadata(tmp.path(), "no-slash", "main", CommitId::from("c1"))
                .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRepo { .. }));
        assert!(!is_tracked_project(tmp.path()));
    }

    #[test]
    fn missing_sync_status_is_clean_default() {
        let tmp = TempDir::new().unwrap();
        let status = load_sync_status(tmp.path()).unwrap();
        assert_eq!(status, SyncStatus::default());
    }

    #[test]
    fn conflict_status_roundtrip_and_clear() {
        let tmp = TempDir::new().unwrap();
        let commit = sample_commit("c7");
        save_sync_status(tmp.path(), &SyncStatus::conflicted(&commit, Utc::now())).unwrap();

        let loaded = load_sync_status(tmp.path()).unwrap();
        assert!(loaded.has_conflicts);
        assert_eq!(loaded.current_commit, Some(CommitId::from("c7")));
        assert_eq!(loaded.conflict_commit.map(|c| c.id), Some(CommitId::from("c7")));

        clear_sync_status(tmp.path()).unwrap();
        assert!(!sync_status_path(tmp.path()).exists());
        clear_sync_status(tmp.path()).expect("clearing twice is fine");
    }

    #[test]
    fn conflict_patch_write_and_remove() {
        let tmp = TempDir::new().unwrap();
        let path = write_conflict_patch(tmp.path(), b"diff --git a/x b/x\n").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"diff --git a/x b/x\n");
        remove_conflict_patch(tmp.path()).unwrap();
        assert!(!path.exists());
        remove_conflict_patch(tmp.path()).expect("removing twice is fine");
    }
}
