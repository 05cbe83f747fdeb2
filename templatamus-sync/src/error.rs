//! Error types for templatamus-sync.

use std::path::PathBuf;

use thiserror::Error;

use templatamus_core::error::{PromptError, SourceError, StoreError, VcsError};
use templatamus_core::types::{CommitId, CommitInfo};

/// All errors that can end a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Metadata store failure, including a missing or malformed project.
    #[error("metadata store error: {0}")]
    Store(#[from] StoreError),

    /// Fetching history or a diff from the source repository failed.
    #[error("source repository error: {0}")]
    Source(#[from] SourceError),

    /// A `git` operation failed for a reason other than a patch conflict.
    #[error("version control error: {0}")]
    Vcs(#[from] VcsError),

    #[error("{0}")]
    Prompt(#[from] PromptError),

    /// Applying `commit` conflicted with local changes. The conflict record and
    /// the patch are on disk; the run stopped here.
    #[error("merge conflicts detected while applying commit {} from {repo}", .commit.id)]
    Conflict {
        repo: String,
        commit: Box<CommitInfo>,
        patch: PathBuf,
        rejects: Vec<PathBuf>,
    },

    /// The operator declined both resolving and skipping an open conflict.
    #[error("sync aborted: conflicts from commit {commit} are still unresolved")]
    ConflictUnresolved { commit: CommitId },

    /// `sync.json` reports conflicts but carries no commit snapshot.
    #[error("conflict record at {path} has no conflict commit information")]
    MissingConflictCommit { path: PathBuf },

    /// The working tree is dirty and the operator chose not to continue.
    #[error("{path} has uncommitted changes; commit or stash them first")]
    DirtyWorktree { path: PathBuf },
}
