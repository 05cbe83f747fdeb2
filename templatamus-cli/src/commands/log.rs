//! `templatamus log` — upstream history of the project's branch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use templatamus_core::{store, types::CommitInfo};
use templatamus_github::GitHubClient;
use templatamus_sync::{fetch_history, reconcile};

use super::{load_config, locate_project, prompt::DialoguerPrompter};

/// Arguments for `templatamus log`.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Project directory. Defaults to the current directory.
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Only list commits a sync would offer.
    #[arg(long)]
    pub pending: bool,
}

impl LogArgs {
    pub fn run(self) -> Result<()> {
        let dir = locate_project(self.dir, &DialoguerPrompter::new())?;
        let metadata = store::load_metadata(&dir)
            .with_context(|| format!("failed to load metadata for {}", dir.display()))?;
        let client = GitHubClient::new(&load_config()?);

        let history = fetch_history(&client, &metadata).with_context(|| {
            format!(
                "failed to fetch history of {}@{}",
                metadata.source_repo, metadata.source_branch
            )
        })?;

        if self.pending {
            let plan = reconcile(history, &metadata);
            if plan.is_degraded() {
                println!(
                    "{} commit {} is not in the fetched history; listing every unapplied commit",
                    "warning:".yellow().bold(),
                    metadata.source_commit.short()
                );
            }
            if plan.is_up_to_date() {
                println!("✓ Project is up to date with {}.", metadata.source_repo);
                return Ok(());
            }
            println!("{} pending commit(s):", plan.candidates.len());
            for commit in &plan.candidates {
                println!("  {}", format_line(commit, false));
            }
            return Ok(());
        }

        println!(
            "{}@{} ({} commits, oldest first)",
            metadata.source_repo.bold(),
            metadata.source_branch,
            history.len()
        );
        for commit in &history {
            let is_base = commit.id == metadata.source_commit;
            println!("  {}", format_line(commit, is_base));
        }
        Ok(())
    }
}

fn format_line(commit: &CommitInfo, is_base: bool) -> String {
    let marker = if is_base {
        "[BASE]   ".cyan().to_string()
    } else if commit.is_applied {
        "[APPLIED]".green().to_string()
    } else {
        "         ".to_string()
    };
    format!(
        "{marker} {} {} {:<16} {}",
        commit.id.short().yellow(),
        commit.date.format("%Y-%m-%d"),
        commit.author,
        commit.summary()
    )
}
