//! `templatamus init [PATH] [--repo R] [--branch B | --tag T] [--commit SHA] [--git]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use templatamus_core::{
    ports::Prompter,
    store,
    types::{CommitId, RepoSlug},
    UserConfig,
};
use templatamus_git::GitCli;
use templatamus_github::GitHubClient;

use super::{load_config, prompt::DialoguerPrompter};

/// Start tracking a directory that was generated from a template repository.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory. Defaults to the current directory.
    pub path: Option<PathBuf>,

    /// Template repository as owner/name. Chosen from ~/.templatamus when omitted.
    #[arg(long, short = 'r')]
    pub repo: Option<String>,

    /// Branch the project follows. Chosen interactively when omitted.
    #[arg(long, short = 'b', conflicts_with = "tag")]
    pub branch: Option<String>,

    /// Tag the project was generated from. The project then follows the
    /// repository's default branch.
    #[arg(long, short = 't')]
    pub tag: Option<String>,

    /// Commit the project was generated from. Defaults to the tag's commit or
    /// the newest commit of the branch.
    #[arg(long, short = 'c')]
    pub commit: Option<String>,

    /// Initialise a git repository and record an initial commit.
    #[arg(long)]
    pub git: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let raw = match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("cannot determine current directory")?,
        };
        let dir = raw
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", raw.display()))?;
        if store::is_tracked_project(&dir) {
            bail!(
                "{} is already a templatamus project; run `templatamus status` to inspect it",
                dir.display()
            );
        }

        let config = load_config()?;
        let prompter = DialoguerPrompter::new();
        let repo = match &self.repo {
            Some(repo) => repo.clone(),
            None => choose_repo(&config, &prompter)?,
        };
        let slug: RepoSlug = repo.parse()?;
        let client = GitHubClient::new(&config);

        let (branch, reference, commit) = match &self.tag {
            Some(tag) => {
                let branch = client
                    .default_branch(&slug)
                    .with_context(|| format!("failed to look up the default branch of {slug}"))?;
                let commit = match &self.commit {
                    Some(sha) => CommitId::from(sha.as_str()),
                    None => resolve_tag_or_name(&client, &slug, tag),
                };
                (branch, tag.clone(), commit)
            }
            None => {
                let branch = match &self.branch {
                    Some(branch) => branch.clone(),
                    None => choose_branch(&client, &slug, &prompter)?,
                };
                let commit = match &self.commit {
                    Some(sha) => CommitId::from(sha.as_str()),
                    None => client
                        .head_commit(&slug, &branch)
                        .with_context(|| format!("failed to fetch the head of {slug}@{branch}"))?
                        .map(|c| c.id)
                        .with_context(|| format!("no commits found on branch {branch}"))?,
                };
                (branch.clone(), branch, commit)
            }
        };

        store::create_initial_metadata(&dir, &repo, &branch, commit.clone())
            .with_context(|| format!("failed to write metadata in {}", dir.display()))?;
        println!(
            "✓ Tracking {} from {slug}@{reference} (commit {})",
            dir.display(),
            commit.short()
        );
        println!("  Saved to: {}", store::metadata_path(&dir).display());

        if self.git {
            if dir.join(".git").exists() {
                println!("  {} already is a git repository; skipping --git", dir.display());
            } else {
                let message = format!("Initial commit from {repo}@{reference}");
                GitCli::new()
                    .init_repo(&dir, &message)
                    .with_context(|| format!("git init failed in {}", dir.display()))?;
                println!("  Committed: {message}");
            }
        }
        Ok(())
    }
}

fn choose_repo(config: &UserConfig, prompter: &dyn Prompter) -> Result<String> {
    if config.repos.is_empty() {
        bail!("no template repositories configured in ~/.templatamus; pass --repo owner/name");
    }
    let index = prompter
        .select("Choose the template repository", &config.repos)
        .context("repository prompt failed")?;
    config
        .repos
        .get(index)
        .cloned()
        .context("repository selection out of range")
}

/// Upstream branches with the default branch listed first.
fn choose_branch(client: &GitHubClient, slug: &RepoSlug, prompter: &dyn Prompter) -> Result<String> {
    let default = client
        .default_branch(slug)
        .with_context(|| format!("failed to look up the default branch of {slug}"))?;
    let mut branches = client
        .list_branches(slug)
        .with_context(|| format!("failed to list branches of {slug}"))?;
    branches.retain(|b| *b != default);
    branches.insert(0, default);

    let index = prompter
        .select("Choose the branch to follow", &branches)
        .context("branch prompt failed")?;
    branches
        .get(index)
        .cloned()
        .context("branch selection out of range")
}

/// Tag's commit, or the tag name itself when it cannot be resolved.
fn resolve_tag_or_name(client: &GitHubClient, slug: &RepoSlug, tag: &str) -> CommitId {
    match client.resolve_tag(slug, tag) {
        Ok(commit) => commit,
        Err(err) => {
            tracing::warn!("could not resolve tag {tag} of {slug} to a commit: {err}");
            CommitId::from(tag)
        }
    }
}
