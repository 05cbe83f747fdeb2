//! Error types for templatamus-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the metadata store and user config.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write/save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error on load, with the file path.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The directory has no `.templatamus/metadata.json`.
    #[error("no templatamus metadata found at {path}")]
    MetadataNotFound { path: PathBuf },

    /// `source_repo` is not of the form `owner/name`.
    #[error("invalid repository format: {value:?} (expected owner/name)")]
    InvalidRepo { value: String },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Errors reported by a source-repository collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The remote answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The response body could not be read or decoded.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Errors reported by a version-control collaborator.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The subprocess could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The subprocess exited unsuccessfully.
    #[error("`{command}` failed (exit code {exit_code:?}): {stderr}")]
    Command {
        command: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    /// Filesystem failure around the subprocess (temp patch file, reject scan).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by an interactive-prompt collaborator.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt failed: {0}")]
    Interaction(String),

    #[error("prompt cancelled")]
    Cancelled,
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
