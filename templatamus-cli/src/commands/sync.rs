//! `templatamus sync` — pick upstream commits and apply them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use templatamus_core::{store, types::CommitInfo};
use templatamus_git::GitCli;
use templatamus_github::GitHubClient;
use templatamus_sync::{Resolution, SyncError, SyncOptions, SyncOutcome, Syncer};

use super::{display_relative, load_config, locate_project, prompt::DialoguerPrompter};

/// Arguments for `templatamus sync`.
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Project directory. Defaults to the current directory.
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Apply on top of uncommitted local changes without asking.
    #[arg(long)]
    pub allow_dirty: bool,

    /// Treat the open conflict as resolved: commit the working tree and mark
    /// the commit applied.
    #[arg(long, conflicts_with = "skip")]
    pub resolved: bool,

    /// Drop the open conflict without marking its commit applied.
    #[arg(long)]
    pub skip: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let prompter = DialoguerPrompter::new();
        let dir = locate_project(self.dir.clone(), &prompter)?;
        let metadata = store::load_metadata(&dir)
            .with_context(|| format!("failed to load metadata for {}", dir.display()))?;
        let config = load_config()?;

        println!(
            "{} {} with {}@{}",
            "Syncing".bold(),
            dir.display(),
            metadata.source_repo.cyan(),
            metadata.source_branch
        );

        let client = GitHubClient::new(&config);
        let git = GitCli::new();
        let outcome = Syncer::new(&dir, &client, &git, &prompter)
            .with_options(self.options())
            .run();

        match outcome {
            Ok(outcome) => {
                print_outcome(&outcome);
                Ok(())
            }
            Err(SyncError::Conflict {
                repo,
                commit,
                patch,
                rejects,
            }) => {
                print_conflict(&dir, &commit, &patch, &rejects);
                bail!(
                    "merge conflicts applying {} from {repo}; resolve them and run templatamus again",
                    commit.id.short()
                )
            }
            Err(e) => Err(e).with_context(|| format!("sync failed for {}", dir.display())),
        }
    }

    fn options(&self) -> SyncOptions {
        let conflict_action = if self.resolved {
            Some(Resolution::Resolved)
        } else if self.skip {
            Some(Resolution::Skip)
        } else {
            None
        };
        SyncOptions {
            allow_dirty: self.allow_dirty,
            conflict_action,
        }
    }
}

fn print_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::UpToDate => println!("✓ Project is already up to date."),
        SyncOutcome::NothingSelected => println!("No commits selected. Nothing applied."),
        SyncOutcome::Applied(ids) => {
            for id in ids {
                println!("  ✎  applied {}", id.short());
            }
            println!("✓ Sync completed: {} commit(s) applied.", ids.len());
        }
        SyncOutcome::ConflictResolved(id) => {
            println!("✓ Conflicts from {} committed and marked applied.", id.short());
            println!("Run templatamus again to pick up further commits.");
        }
        SyncOutcome::ConflictSkipped(id) => {
            println!("Skipped commit {} due to unresolved conflicts.", id.short());
            println!("It will be offered again on the next sync.");
        }
    }
}

fn print_conflict(dir: &Path, commit: &CommitInfo, patch: &Path, rejects: &[PathBuf]) {
    println!();
    println!(
        "{} while applying commit {}",
        "Merge conflicts detected".red().bold(),
        commit.id.short()
    );
    println!("Commit message: {}", commit.summary());
    println!("Author: {}", commit.author);
    println!("Date: {}", commit.date.to_rfc3339());
    if !rejects.is_empty() {
        println!("Rejected hunks:");
        for reject in rejects {
            println!("  ✗  {}", display_relative(dir, reject));
        }
    }
    println!();
    println!("To resolve the conflicts:");
    println!(
        "  1. The patch has been saved to {}",
        display_relative(dir, patch)
    );
    println!("  2. Review the conflicts in your working directory");
    println!("  3. Resolve them by hand and remove the .rej files");
    println!("  4. Run `templatamus` again (or `templatamus sync --resolved`) to commit");
    println!();
    println!("To skip this commit instead:");
    println!("  1. Run `git reset --hard HEAD` to discard the partial changes");
    println!("  2. Run `templatamus sync --skip`");
}
