//! Selection/apply driver: one `templatamus sync` run from start to finish.

use std::collections::BTreeSet;
use std::path::PathBuf;

use templatamus_core::{
    ports::{ApplyOutcome, CommitOutcome, CommitSource, Prompter, VersionControl},
    store,
    types::{CommitId, CommitInfo, ProjectMetadata, RepoSlug},
};

use crate::error::SyncError;
use crate::machine::{self, Resolution, SyncState};
use crate::reconcile::{self, Reconciliation};

const SELECT_PROMPT: &str = "Select commits to apply (space to toggle, enter to confirm)";
const RESOLVED_PROMPT: &str = "Have you resolved the conflicts and want to continue?";
const SKIP_PROMPT: &str = "Do you want to abort applying this commit and mark it as skipped?";

/// Knobs for a single run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Apply on top of uncommitted local changes without asking.
    pub allow_dirty: bool,
    /// Pre-answered decision for an open conflict; `None` asks the operator.
    pub conflict_action: Option<Resolution>,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No unapplied upstream commits.
    UpToDate,
    /// Candidates existed but the operator selected none.
    NothingSelected,
    /// The listed commits were applied and committed, in order.
    Applied(Vec<CommitId>),
    /// An open conflict was resolved and its commit marked applied.
    ConflictResolved(CommitId),
    /// An open conflict was dropped; its commit stays a candidate.
    ConflictSkipped(CommitId),
}

/// Drives one sync run for the project at `dir`.
///
/// Collaborators are borrowed trait objects so the CLI can hand in the GitHub
/// client, the `git` subprocess wrapper, and the terminal prompter, while tests
/// hand in in-memory fakes.
pub struct Syncer<'a> {
    dir: PathBuf,
    source: &'a dyn CommitSource,
    vcs: &'a dyn VersionControl,
    prompt: &'a dyn Prompter,
    options: SyncOptions,
}

impl<'a> Syncer<'a> {
    pub fn new(
        dir: impl Into<PathBuf>,
        source: &'a dyn CommitSource,
        vcs: &'a dyn VersionControl,
        prompt: &'a dyn Prompter,
    ) -> Self {
        Self {
            dir: dir.into(),
            source,
            vcs,
            prompt,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the sync.
    ///
    /// An open conflict is settled first and ends the run; otherwise upstream
    /// history is reconciled, the operator picks commits, and each is applied
    /// and committed in chronological order until one conflicts.
    pub fn run(&self) -> Result<SyncOutcome, SyncError> {
        let mut metadata = store::load_metadata(&self.dir)?;

        if let SyncState::Conflicted { commit, .. } = machine::load_state(&self.dir)? {
            return self.resume(&mut metadata, &commit);
        }

        let plan = self.plan(&metadata)?;
        if plan.is_up_to_date() {
            tracing::info!("{} is up to date with {}", self.dir.display(), metadata.source_repo);
            return Ok(SyncOutcome::UpToDate);
        }

        let selected = self.choose(&metadata, plan.candidates)?;
        if selected.is_empty() {
            return Ok(SyncOutcome::NothingSelected);
        }

        self.ensure_clean_worktree()?;
        let slug = metadata.repo_slug()?;
        self.apply_all(&mut metadata, &slug, selected)
    }

    /// Fetch upstream history and reconcile it against the project metadata.
    pub fn plan(&self, metadata: &ProjectMetadata) -> Result<Reconciliation, SyncError> {
        let history = fetch_history(self.source, metadata)?;
        Ok(reconcile::reconcile(history, metadata))
    }

    fn resume(
        &self,
        metadata: &mut ProjectMetadata,
        commit: &CommitInfo,
    ) -> Result<SyncOutcome, SyncError> {
        let resolution = match self.options.conflict_action {
            Some(resolution) => resolution,
            None => self.ask_resolution(commit)?,
        };
        machine::settle(&self.dir, self.vcs, metadata, commit, resolution)?;
        Ok(match resolution {
            Resolution::Resolved => SyncOutcome::ConflictResolved(commit.id.clone()),
            Resolution::Skip => SyncOutcome::ConflictSkipped(commit.id.clone()),
        })
    }

    fn ask_resolution(&self, commit: &CommitInfo) -> Result<Resolution, SyncError> {
        if self.prompt.confirm(RESOLVED_PROMPT, true)? {
            return Ok(Resolution::Resolved);
        }
        if self.prompt.confirm(SKIP_PROMPT, false)? {
            return Ok(Resolution::Skip);
        }
        Err(SyncError::ConflictUnresolved {
            commit: commit.id.clone(),
        })
    }

    /// Let the operator pick from `candidates`; returns the picks oldest first.
    fn choose(
        &self,
        metadata: &ProjectMetadata,
        candidates: Vec<CommitInfo>,
    ) -> Result<Vec<CommitInfo>, SyncError> {
        let candidates: Vec<CommitInfo> = candidates
            .into_iter()
            .filter(|c| !metadata.is_applied(&c.id))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let labels: Vec<String> = candidates.iter().map(commit_label).collect();
        let picked: BTreeSet<usize> = self
            .prompt
            .multi_select(SELECT_PROMPT, &labels)?
            .into_iter()
            .filter(|&i| i < candidates.len())
            .collect();

        let mut selected: Vec<CommitInfo> = candidates
            .into_iter()
            .enumerate()
            .filter(|(i, _)| picked.contains(i))
            .map(|(_, c)| c)
            .collect();
        reconcile::sort_chronologically(&mut selected);
        Ok(selected)
    }

    fn ensure_clean_worktree(&self) -> Result<(), SyncError> {
        if self.options.allow_dirty || !self.vcs.has_uncommitted_changes(&self.dir)? {
            return Ok(());
        }
        let question = format!(
            "{} has uncommitted changes. Apply upstream commits on top of them?",
            self.dir.display()
        );
        if self.prompt.confirm(&question, false)? {
            Ok(())
        } else {
            Err(SyncError::DirtyWorktree {
                path: self.dir.clone(),
            })
        }
    }

    fn apply_all(
        &self,
        metadata: &mut ProjectMetadata,
        slug: &RepoSlug,
        selected: Vec<CommitInfo>,
    ) -> Result<SyncOutcome, SyncError> {
        let mut applied = Vec::with_capacity(selected.len());
        for commit in selected {
            tracing::info!("applying {} {}", commit.id.short(), commit.summary());
            let diff = self.source.get_diff(slug, &commit.id)?;

            match self.vcs.apply_patch(&self.dir, &diff)? {
                ApplyOutcome::Applied => {
                    let message = machine::sync_commit_message(&metadata.source_repo, &commit);
                    if self.vcs.commit_changes(&self.dir, &message)? == CommitOutcome::NothingToCommit
                    {
                        tracing::info!("commit {} changed nothing locally", commit.id.short());
                    }
                    machine::record_applied(&self.dir, metadata, &commit)?;
                    applied.push(commit.id);
                }
                ApplyOutcome::Conflict { rejects } => {
                    let patch = machine::record_conflict(&self.dir, &commit, &diff)?;
                    return Err(SyncError::Conflict {
                        repo: metadata.source_repo.clone(),
                        commit: Box::new(commit),
                        patch,
                        rejects,
                    });
                }
            }
        }
        Ok(SyncOutcome::Applied(applied))
    }
}

/// Full upstream history of the project's branch, oldest first, with
/// `is_applied` set from the metadata.
pub fn fetch_history(
    source: &dyn CommitSource,
    metadata: &ProjectMetadata,
) -> Result<Vec<CommitInfo>, SyncError> {
    let slug = metadata.repo_slug()?;
    let mut history = source.list_commits(&slug, &metadata.source_branch, None)?;
    reconcile::sort_chronologically(&mut history);
    reconcile::mark_applied(&mut history, &metadata.applied_commits);
    Ok(history)
}

/// `"<short id> <summary>"`, as shown in the selection list.
pub fn commit_label(commit: &CommitInfo) -> String {
    format!("{} {}", commit.id.short(), commit.summary())
}
