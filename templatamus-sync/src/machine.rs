//! Persisted sync state and its transitions.
//!
//! A project is either CLEAN (no `sync.json`, or one that reports no open
//! conflict) or CONFLICTED (a commit failed to apply and is waiting for the
//! operator). Every transition here writes its result through the metadata
//! store before returning.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use templatamus_core::{
    ports::{CommitOutcome, VersionControl},
    store,
    types::{CommitInfo, ProjectMetadata, SyncStatus},
};

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Clean,
    Conflicted {
        commit: Box<CommitInfo>,
        since: Option<DateTime<Utc>>,
    },
}

/// Operator decision on an open conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Conflicts were fixed by hand; commit the tree and mark the commit applied.
    Resolved,
    /// Drop the conflict record without marking the commit applied.
    Skip,
}

/// Read the project's current state from `sync.json`.
pub fn load_state(dir: &Path) -> Result<SyncState, SyncError> {
    let status = store::load_sync_status(dir)?;
    if status.has_conflicts && status.conflict_commit.is_none() {
        return Err(SyncError::MissingConflictCommit {
            path: store::sync_status_path(dir),
        });
    }
    if status.is_clean() {
        return Ok(SyncState::Clean);
    }
    match status.conflict_commit {
        Some(commit) => Ok(SyncState::Conflicted {
            commit: Box::new(commit),
            since: status.conflicts_at,
        }),
        None => Err(SyncError::MissingConflictCommit {
            path: store::sync_status_path(dir),
        }),
    }
}

/// Commit message for a commit that applied cleanly.
pub fn sync_commit_message(repo: &str, commit: &CommitInfo) -> String {
    format!("Synced with {repo}: {}", commit.summary())
}

/// Commit message for a commit whose conflicts the operator resolved.
pub fn resolved_commit_message(repo: &str, commit: &CommitInfo) -> String {
    format!("{} (resolved conflicts)", sync_commit_message(repo, commit))
}

/// Append `commit` to the applied set, refresh `last_synced_at`, and persist.
pub fn record_applied(
    dir: &Path,
    metadata: &mut ProjectMetadata,
    commit: &CommitInfo,
) -> Result<(), SyncError> {
    if !metadata.record_applied(commit.id.clone(), Utc::now()) {
        tracing::debug!("commit {} was already recorded as applied", commit.id.short());
    }
    store::save_metadata(dir, metadata)?;
    Ok(())
}

/// CLEAN -> CONFLICTED. Saves the rejected diff next to the conflict record
/// and returns the patch path.
pub fn record_conflict(dir: &Path, commit: &CommitInfo, diff: &[u8]) -> Result<PathBuf, SyncError> {
    let patch = store::write_conflict_patch(dir, diff)?;
    store::save_sync_status(dir, &SyncStatus::conflicted(commit, Utc::now()))?;
    tracing::info!(
        "recorded conflict for commit {}; patch saved to {}",
        commit.id.short(),
        patch.display()
    );
    Ok(patch)
}

/// CONFLICTED -> CLEAN after the operator fixed the tree.
///
/// Nothing is cleaned up until the commit succeeded; a failing commit leaves
/// the conflict record, the patch and the metadata as they were.
pub fn resolve(
    dir: &Path,
    vcs: &dyn VersionControl,
    metadata: &mut ProjectMetadata,
    commit: &CommitInfo,
) -> Result<(), SyncError> {
    let message = resolved_commit_message(&metadata.source_repo, commit);
    if vcs.commit_changes(dir, &message)? == CommitOutcome::NothingToCommit {
        tracing::info!(
            "nothing to commit for resolved commit {}; working tree already matches HEAD",
            commit.id.short()
        );
    }
    store::remove_conflict_patch(dir)?;
    record_applied(dir, metadata, commit)?;
    store::clear_sync_status(dir)?;
    Ok(())
}

/// CONFLICTED -> CLEAN without applying. The commit stays out of the applied
/// set, so the next run offers it again.
pub fn skip(dir: &Path, commit: &CommitInfo) -> Result<(), SyncError> {
    store::clear_sync_status(dir)?;
    store::remove_conflict_patch(dir)?;
    tracing::info!("skipped commit {}", commit.id.short());
    Ok(())
}

/// Apply an operator decision to an open conflict.
pub fn settle(
    dir: &Path,
    vcs: &dyn VersionControl,
    metadata: &mut ProjectMetadata,
    commit: &CommitInfo,
    resolution: Resolution,
) -> Result<(), SyncError> {
    match resolution {
        Resolution::Resolved => resolve(dir, vcs, metadata, commit),
        Resolution::Skip => skip(dir, commit),
    }
}
