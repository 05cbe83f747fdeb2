//! Domain types for project provenance and sync progress.
//!
//! All types serialize via serde + serde_json with stable field names; the
//! on-disk shape is the contract for `.templatamus/metadata.json` and
//! `.templatamus/sync.json`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A commit identifier (full SHA) in the source repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CommitId(pub String);

impl CommitId {
    /// The abbreviated form used in prompts and messages (first 8 characters).
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A source repository split into owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidRepo {
            value: s.to_owned(),
        };
        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Applied commits
// ---------------------------------------------------------------------------

/// Insertion-ordered set of applied commit identifiers.
///
/// Serialized as a plain JSON array. Duplicates found on load are collapsed,
/// keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CommitId>", into = "Vec<CommitId>")]
pub struct AppliedCommits {
    order: Vec<CommitId>,
    members: HashSet<CommitId>,
}

impl AppliedCommits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id`. Returns `false` (and changes nothing) if already present.
    pub fn push(&mut self, id: CommitId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Identifiers in application order.
    pub fn iter(&self) -> impl Iterator<Item = &CommitId> {
        self.order.iter()
    }

    pub fn last(&self) -> Option<&CommitId> {
        self.order.last()
    }
}

impl From<Vec<CommitId>> for AppliedCommits {
    fn from(ids: Vec<CommitId>) -> Self {
        let mut applied = Self::new();
        for id in ids {
            applied.push(id);
        }
        applied
    }
}

impl From<AppliedCommits> for Vec<CommitId> {
    fn from(applied: AppliedCommits) -> Self {
        applied.order
    }
}

impl FromIterator<CommitId> for AppliedCommits {
    fn from_iter<I: IntoIterator<Item = CommitId>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Provenance and sync progress of a generated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Template repository, `owner/name`.
    pub source_repo: String,
    pub source_branch: String,
    /// Commit the project was generated from; reconciliation anchor.
    pub source_commit: CommitId,
    pub created_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
    #[serde(default)]
    pub applied_commits: AppliedCommits,
}

impl ProjectMetadata {
    /// Fresh metadata for a project generated from `commit`. The anchor is the
    /// first applied commit.
    pub fn new(
        source_repo: impl Into<String>,
        source_branch: impl Into<String>,
        source_commit: CommitId,
    ) -> Self {
        let now = Utc::now();
        let mut applied_commits = AppliedCommits::new();
        applied_commits.push(source_commit.clone());
        Self {
            source_repo: source_repo.into(),
            source_branch: source_branch.into(),
            source_commit,
            created_at: now,
            last_synced_at: now,
            applied_commits,
        }
    }

    /// Parse `source_repo` into owner and name.
    pub fn repo_slug(&self) -> Result<RepoSlug, StoreError> {
        self.source_repo.parse()
    }

    pub fn is_applied(&self, id: &CommitId) -> bool {
        self.applied_commits.contains(id)
    }

    /// Record `id` as applied at `at`. Returns `false` if it already was.
    pub fn record_applied(&mut self, id: CommitId, at: DateTime<Utc>) -> bool {
        let added = self.applied_commits.push(id);
        if added {
            self.last_synced_at = at;
        }
        added
    }
}

/// A commit fetched from the source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    #[serde(rename = "sha")]
    pub id: CommitId,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub url: String,
    /// Derived from membership in `applied_commits`; never persisted.
    #[serde(skip)]
    pub is_applied: bool,
}

impl CommitInfo {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Persisted record of an interrupted sync. Absent on disk means clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncStatus {
    #[serde(default)]
    pub in_progress: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_commit: Option<CommitId>,
    #[serde(default)]
    pub has_conflicts: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_commit: Option<CommitInfo>,
}

impl SyncStatus {
    /// Status recorded when applying `commit` produced a conflict.
    pub fn conflicted(commit: &CommitInfo, at: DateTime<Utc>) -> Self {
        Self {
            in_progress: true,
            current_commit: Some(commit.id.clone()),
            has_conflicts: true,
            conflicts_at: Some(at),
            conflict_commit: Some(commit.clone()),
        }
    }

    /// `true` when no interrupted sync is recorded.
    pub fn is_clean(&self) -> bool {
        !(self.in_progress && self.has_conflicts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<CommitId> {
        raw.iter().map(|s| CommitId::from(*s)).collect()
    }

    #[test]
    fn commit_id_short_truncates_to_eight() {
        assert_eq!(CommitId::from("0123456789abcdef").short(), "01234567");
        assert_eq!(CommitId::from("abc").short(), "abc");
    }

    #[test]
    fn repo_slug_parses_owner_and_name() {
        let slug: RepoSlug = "acme/starter".parse().expect("slug");
        assert_eq!(slug.owner, "acme");
        assert_eq!(slug.name, "starter");
        assert_eq!(slug.to_string(), "acme/starter");
    }

    #[test]
    fn repo_slug_rejects_malformed_values() {
        for bad in ["acme", "/starter", "acme/", "a/b/c", ""] {
            let err = bad.parse::<RepoSlug>().unwrap_err();
            assert!(
                matches!(&err, StoreError::InvalidRepo { value } if value == bad),
                "got: {err}"
            );
        }
    }

    #[test]
    fn applied_commits_ignores_duplicates() {
        let mut applied = AppliedCommits::new();
        assert!(applied.push(CommitId::from("c1")));
        assert!(applied.push(CommitId::from("c2")));
        assert!(!applied.push(CommitId::from("c1")));
        assert_eq!(applied.len(), 2);
        let order: Vec<_> = applied.iter().map(CommitId::as_str).collect();
        assert_eq!(order, ["c1", "c2"]);
    }

    #[test]
    fn applied_commits_serializes_as_array_and_dedups_on_load() {
        let applied = AppliedCommits::from(ids(&["c1", "c2"]));
        let json = serde_json::to_string(&applied).expect("serialize");
        assert_eq!(json, r#"["c1","c2"]"#);

        let loaded: AppliedCommits = serde_json::from_str(r#"["c1","c2","c1","c3"]"#).unwrap();
        let order: Vec<_> = loaded.iter().map(CommitId::as_str).collect();
        assert_eq!(order, ["c1", "c2", "c3"]);
    }

    #[test]
    fn new_metadata_seeds_anchor_as_applied() {
        let meta = ProjectMetadata::new("acme/starter", "main", CommitId::from("c1"));
        assert!(meta.is_applied(&CommitId::from("c1")));
        assert_eq!(meta.applied_commits.len(), 1);
    }

    #[test]
    fn record_applied_refreshes_last_synced_only_when_new() {
        let mut meta = ProjectMetadata::new("acme/starter", "main", CommitId::from("c1"));
        let later = meta.last_synced_at + chrono::Duration::minutes(5);
        assert!(meta.record_applied(CommitId::from("c2"), later));
        assert_eq!(meta.last_synced_at, later);

        let even_later = later + chrono::Duration::minutes(5);
        assert!(!meta.record_applied(CommitId::from("c2"), even_later));
        assert_eq!(meta.last_synced_at, later);
    }

    #[test]
    fn commit_info_skips_is_applied_and_uses_sha_key() {
        let commit = CommitInfo {
            id: CommitId::from("abc"),
            message: "Add thing\n\nLonger body".into(),
            author: "dev".into(),
            date: Utc::now(),
            url: "https://example.invalid/abc".into(),
            is_applied: true,
        };
        assert_eq!(commit.summary(), "Add thing");
        let value = serde_json::to_value(&commit).expect("serialize");
        assert_eq!(value["sha"], "abc");
        assert!(value.get("is_applied").is_none());

        let back: CommitInfo = serde_json::from_value(value).expect("deserialize");
        assert!(!back.is_applied);
    }

    #[test]
    fn default_sync_status_is_clean() {
        assert!(SyncStatus::default().is_clean());
    }
}
