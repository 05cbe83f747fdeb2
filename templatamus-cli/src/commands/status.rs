//! `templatamus status` — provenance and sync state, read from disk only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use templatamus_core::{
    store,
    types::{CommitId, ProjectMetadata},
};
use templatamus_sync::{load_state, SyncState};

use super::{display_relative, locate_project, prompt::DialoguerPrompter};

/// Arguments for `templatamus status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Project directory. Defaults to the current directory.
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let dir = locate_project(self.dir, &DialoguerPrompter::new())?;
        let metadata = store::load_metadata(&dir)
            .with_context(|| format!("failed to load metadata for {}", dir.display()))?;
        let state = load_state(&dir)
            .with_context(|| format!("failed to load sync state for {}", dir.display()))?;

        let report = build_report(&dir, &metadata, &state);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_report(&report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    project: String,
    source: SourceJson,
    created_at: String,
    last_synced_at: String,
    last_synced_age: String,
    applied_commits: usize,
    last_applied: Option<CommitId>,
    state: &'static str,
    conflict: Option<ConflictJson>,
}

#[derive(Debug, Serialize)]
struct SourceJson {
    repo: String,
    branch: String,
    commit: CommitId,
}

#[derive(Debug, Serialize)]
struct ConflictJson {
    commit: CommitId,
    summary: String,
    author: String,
    since: Option<String>,
    patch: Option<String>,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "field")]
    field: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

fn build_report(dir: &Path, metadata: &ProjectMetadata, state: &SyncState) -> StatusReport {
    let conflict = match state {
        SyncState::Clean => None,
        SyncState::Conflicted { commit, since } => {
            let patch = store::conflict_patch_path(dir);
            Some(ConflictJson {
                commit: commit.id.clone(),
                summary: commit.summary().to_string(),
                author: commit.author.clone(),
                since: since.map(|t| t.to_rfc3339()),
                patch: patch
                    .is_file()
                    .then(|| display_relative(dir, &patch)),
            })
        }
    };

    StatusReport {
        project: dir.display().to_string(),
        source: SourceJson {
            repo: metadata.source_repo.clone(),
            branch: metadata.source_branch.clone(),
            commit: metadata.source_commit.clone(),
        },
        created_at: metadata.created_at.to_rfc3339(),
        last_synced_at: metadata.last_synced_at.to_rfc3339(),
        last_synced_age: format_age(metadata.last_synced_at, Utc::now()),
        applied_commits: metadata.applied_commits.len(),
        last_applied: metadata.applied_commits.last().cloned(),
        state: if conflict.is_some() { "conflicted" } else { "clean" },
        conflict,
    }
}

fn print_report(report: &StatusReport) {
    println!(
        "Templatamus v{} | {}",
        env!("CARGO_PKG_VERSION"),
        report.project.bold()
    );

    let mut rows = vec![
        StatusRow {
            field: "source",
            value: format!("{}@{}", report.source.repo, report.source.branch),
        },
        StatusRow {
            field: "generated from",
            value: report.source.commit.short().to_string(),
        },
        StatusRow {
            field: "applied commits",
            value: report.applied_commits.to_string(),
        },
        StatusRow {
            field: "last sync",
            value: format!("{} ago", report.last_synced_age),
        },
    ];
    if let Some(last) = &report.last_applied {
        rows.push(StatusRow {
            field: "last applied",
            value: last.short().to_string(),
        });
    }
    let state = match report.state {
        "clean" => "■ CLEAN".green().bold().to_string(),
        _ => "■ CONFLICTED".red().bold().to_string(),
    };
    rows.push(StatusRow {
        field: "state",
        value: state,
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if let Some(conflict) = &report.conflict {
        println!(
            "Open conflict: {} {} ({})",
            conflict.commit.short().yellow(),
            conflict.summary,
            conflict.author
        );
        if let Some(since) = &conflict.since {
            println!("  since {since}");
        }
        if let Some(patch) = &conflict.patch {
            println!("  patch saved to {patch}");
        }
        println!("Run 'templatamus sync --resolved' or 'templatamus sync --skip' to settle it.");
    }
}

/// `now - timestamp` as `42s`, `5m`, `3h` or `2d`; future timestamps read `0s`.
fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(timestamp).num_seconds().max(0);
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 60 * 60 => format!("{}m", s / 60),
        s if s < 60 * 60 * 24 => format!("{}h", s / (60 * 60)),
        s => format!("{}d", s / (60 * 60 * 24)),
    }
}
