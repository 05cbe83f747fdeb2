//! Collaborator contracts consumed by the sync engine.
//!
//! The engine never talks to GitHub, `git`, or the terminal directly; it goes
//! through these traits so each side can be swapped (or faked in tests).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{PromptError, SourceError, VcsError};
use crate::types::{CommitId, CommitInfo, RepoSlug};

/// Upstream template repository.
pub trait CommitSource {
    /// Commits reachable from `branch`, in whatever order the remote lists them.
    fn list_commits(
        &self,
        repo: &RepoSlug,
        branch: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitInfo>, SourceError>;

    /// The commit's change as a unified diff.
    fn get_diff(&self, repo: &RepoSlug, commit: &CommitId) -> Result<Vec<u8>, SourceError>;
}

/// Outcome of applying a patch to the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Every hunk applied cleanly.
    Applied,
    /// Some hunks could not be applied; `rejects` lists the leftover artifacts.
    Conflict { rejects: Vec<PathBuf> },
}

/// Outcome of committing the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NothingToCommit,
}

/// Version control of the generated project.
pub trait VersionControl {
    fn apply_patch(&self, dir: &Path, diff: &[u8]) -> Result<ApplyOutcome, VcsError>;

    /// Stage everything and commit with `message`.
    fn commit_changes(&self, dir: &Path, message: &str) -> Result<CommitOutcome, VcsError>;

    /// Uncommitted changes outside the metadata directory.
    fn has_uncommitted_changes(&self, dir: &Path) -> Result<bool, VcsError>;
}

/// Interactive operator prompts.
pub trait Prompter {
    /// Pick one of `items`; returns its index.
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize, PromptError>;

    /// Pick any subset of `items`; returns indices in ascending order.
    fn multi_select(&self, prompt: &str, items: &[String]) -> Result<Vec<usize>, PromptError>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError>;

    /// Free-text answer, pre-filled with `default` when given.
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String, PromptError>;
}
