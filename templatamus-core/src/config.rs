//! User configuration at `~/.templatamus`.
//!
//! ```json
//! {
//!   "token": "ghp_...",
//!   "repos": ["acme/web-starter", "acme/api-starter"],
//!   "api_url": "https://api.github.com",
//!   "max_commits": 1000
//! }
//! ```
//!
//! The config is an explicit value handed to the GitHub client and the sync
//! driver; nothing reads it from global state. `TEMPLATAMUS_TOKEN` and
//! `TEMPLATAMUS_API_URL` override the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};

pub const CONFIG_FILE: &str = ".templatamus";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_MAX_COMMITS: usize = 1000;

pub const TOKEN_ENV: &str = "TEMPLATAMUS_TOKEN";
pub const API_URL_ENV: &str = "TEMPLATAMUS_API_URL";

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// GitHub token. Empty means anonymous access.
    #[serde(default)]
    pub token: String,
    /// Template repositories offered when adopting a project.
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Upper bound on commits fetched per reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_commits: Option<usize>,
}

impl UserConfig {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn max_commits(&self) -> usize {
        self.max_commits.unwrap_or(DEFAULT_MAX_COMMITS)
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Apply environment overrides using `lookup` (normally `std::env::var`).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.token = token;
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.is_empty()) {
            self.api_url = Some(url);
        }
        self
    }
}

/// `<home>/.templatamus`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE)
}

/// Load the config file under `home`. A missing file yields the default
/// (anonymous) config; a malformed one is a `StoreError::Parse`.
pub fn load_at(home: &Path) -> Result<UserConfig, StoreError> {
    let path = config_path_at(home);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(UserConfig::default()),
        Err(e) => return Err(io_err(&path, e)),
    };
    serde_json::from_str(&contents).map_err(|source| StoreError::Parse { path, source })
}

/// `load_at` convenience wrapper: `dirs::home_dir()` plus environment overrides.
pub fn load() -> Result<UserConfig, StoreError> {
    let home = dirs::home_dir().ok_or(StoreError::HomeNotFound)?;
    Ok(load_at(&home)?.with_overrides(|key| std::env::var(key).ok()))
}
