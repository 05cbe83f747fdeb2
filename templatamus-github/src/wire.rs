//! GitHub REST response shapes and their conversion to domain types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use templatamus_core::types::{CommitId, CommitInfo};

/// `GET /repos/{owner}/{repo}/commits` element.
#[derive(Debug, Deserialize)]
pub(crate) struct GhCommit {
    pub sha: String,
    pub commit: GhCommitDetail,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhCommitDetail {
    pub message: String,
    pub author: Option<GhSignature>,
    pub committer: Option<GhSignature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhSignature {
    pub name: String,
    pub date: DateTime<Utc>,
}

/// Branch and tag listings share this shape.
#[derive(Debug, Deserialize)]
pub(crate) struct GhNamed {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhRepo {
    pub default_branch: String,
}

/// `GET /repos/{owner}/{repo}/git/refs/tags/{tag}` and annotated tag objects.
#[derive(Debug, Deserialize)]
pub(crate) struct GhRef {
    pub object: GhObject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhObject {
    pub sha: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

impl GhCommit {
    /// Author name and date, falling back to the committer signature.
    pub fn into_commit_info(self) -> Result<CommitInfo, String> {
        let GhCommitDetail {
            message,
            author,
            committer,
        } = self.commit;
        let signature = author
            .or(committer)
            .ok_or_else(|| format!("commit {} has neither author nor committer", self.sha))?;
        Ok(CommitInfo {
            id: CommitId::from(self.sha),
            message,
            author: signature.name,
            date: signature.date,
            url: self.html_url,
            is_applied: false,
        })
    }
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
pub(crate) fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().eq_ignore_ascii_case("rel=\"next\""));
        if !is_next {
            return None;
        }
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(url.to_string())
    })
}
