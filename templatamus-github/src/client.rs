//! Blocking GitHub REST client.
//!
//! Commit history is fetched page by page, following the `Link: rel="next"`
//! header, until the branch is exhausted or `max_commits` is reached. Hitting
//! the cap is logged: reconciliation then only sees the newest `max_commits`
//! commits, and an anchor older than that falls back to degraded mode.

use std::io::Read;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use templatamus_core::{
    config::UserConfig,
    error::SourceError,
    ports::CommitSource,
    types::{CommitId, CommitInfo, RepoSlug},
};

use crate::wire::{next_link, GhCommit, GhNamed, GhRef, GhRepo};

const PER_PAGE: usize = 100;
const JSON_ACCEPT: &str = "application/vnd.github+json";
const DIFF_ACCEPT: &str = "application/vnd.github.diff";
const ERROR_BODY_LIMIT: usize = 512;

/// GitHub client built from an explicit [`UserConfig`].
pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    token: Option<String>,
    max_commits: usize,
}

impl GitHubClient {
    pub fn new(config: &UserConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("templatamus/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            api_url: config.api_url().trim_end_matches('/').to_string(),
            token: config.has_token().then(|| config.token.trim().to_string()),
            max_commits: config.max_commits().max(1),
        }
    }

    fn repo_url(&self, repo: &RepoSlug) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.name)
    }

    fn get(&self, url: &str, accept: &str) -> ureq::Request {
        let req = self.agent.get(url).set("Accept", accept);
        match &self.token {
            Some(token) => req.set("Authorization", &format!("token {token}")),
            None => req,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let resp = call(self.get(url, JSON_ACCEPT), url)?;
        decode_json(resp, url)
    }

    /// Branch names, as listed by the remote (first 100).
    pub fn list_branches(&self, repo: &RepoSlug) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/branches?per_page={PER_PAGE}", self.repo_url(repo));
        let branches: Vec<GhNamed> = self.get_json(&url)?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    /// Tag names, newest first as listed by the remote (first 100).
    pub fn list_tags(&self, repo: &RepoSlug) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/tags?per_page={PER_PAGE}", self.repo_url(repo));
        let tags: Vec<GhNamed> = self.get_json(&url)?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    pub fn default_branch(&self, repo: &RepoSlug) -> Result<String, SourceError> {
        let info: GhRepo = self.get_json(&self.repo_url(repo))?;
        Ok(info.default_branch)
    }

    /// Newest commit on `branch`, if the branch has any.
    pub fn head_commit(
        &self,
        repo: &RepoSlug,
        branch: &str,
    ) -> Result<Option<CommitInfo>, SourceError> {
        let url = format!("{}/commits", self.repo_url(repo));
        let req = self
            .get(&url, JSON_ACCEPT)
            .query("sha", branch)
            .query("per_page", "1");
        let page: Vec<GhCommit> = decode_json(call(req, &url)?, &url)?;
        page.into_iter()
            .next()
            .map(|c| into_commit_info(c, &url))
            .transpose()
    }

    /// Commit a tag points at. Annotated tags are dereferenced to their target.
    pub fn resolve_tag(&self, repo: &RepoSlug, tag: &str) -> Result<CommitId, SourceError> {
        let url = format!("{}/git/refs/tags/{tag}", self.repo_url(repo));
        let tag_ref: GhRef = self.get_json(&url)?;
        if tag_ref.object.kind != "tag" {
            return Ok(CommitId::from(tag_ref.object.sha));
        }
        let annotated: GhRef = self.get_json(&tag_ref.object.url)?;
        Ok(CommitId::from(annotated.object.sha))
    }
}

impl CommitSource for GitHubClient {
    fn list_commits(
        &self,
        repo: &RepoSlug,
        branch: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitInfo>, SourceError> {
        let first_url = format!("{}/commits", self.repo_url(repo));
        let per_page = PER_PAGE.to_string();
        let mut req = self
            .get(&first_url, JSON_ACCEPT)
            .query("sha", branch)
            .query("per_page", &per_page);
        if let Some(since) = since {
            req = req.query("since", &since.to_rfc3339_opts(SecondsFormat::Secs, true));
        }

        let mut commits = Vec::new();
        let mut url = first_url;
        let mut pages = 0usize;
        loop {
            let resp = call(req, &url)?;
            let next = resp.header("Link").and_then(next_link);
            let page: Vec<GhCommit> = decode_json(resp, &url)?;
            pages += 1;
            for gh in page {
                commits.push(into_commit_info(gh, &url)?);
            }

            if commits.len() >= self.max_commits {
                if next.is_some() || commits.len() > self.max_commits {
                    tracing::warn!(
                        "commit history of {repo}@{branch} truncated to the newest {} commits",
                        self.max_commits
                    );
                }
                commits.truncate(self.max_commits);
                break;
            }
            let Some(next_url) = next else { break };
            url = next_url;
            req = self.get(&url, JSON_ACCEPT);
        }

        tracing::debug!(
            "fetched {} commits of {repo}@{branch} in {pages} page(s)",
            commits.len()
        );
        Ok(commits)
    }

    fn get_diff(&self, repo: &RepoSlug, commit: &CommitId) -> Result<Vec<u8>, SourceError> {
        let url = format!("{}/commits/{}", self.repo_url(repo), commit);
        let resp = call(self.get(&url, DIFF_ACCEPT), &url)?;
        let mut body = Vec::new();
        resp.into_reader()
            .read_to_end(&mut body)
            .map_err(|e| SourceError::Decode {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn call(req: ureq::Request, url: &str) -> Result<ureq::Response, SourceError> {
    match req.call() {
        Ok(resp) => Ok(resp),
        Err(ureq::Error::Status(status, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            Err(SourceError::Http {
                url: url.to_string(),
                status,
                body: truncate_body(body.trim()),
            })
        }
        Err(ureq::Error::Transport(transport)) => Err(SourceError::Network {
            url: url.to_string(),
            message: transport.to_string(),
        }),
    }
}

fn decode_json<T: DeserializeOwned>(resp: ureq::Response, url: &str) -> Result<T, SourceError> {
    resp.into_json().map_err(|e| SourceError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn into_commit_info(commit: GhCommit, url: &str) -> Result<CommitInfo, SourceError> {
    commit
        .into_commit_info()
        .map_err(|message| SourceError::Decode {
            url: url.to_string(),
            message,
        })
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
