//! Templatamus core library: domain types, metadata store, config, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes and persisted records
//! - [`store`]: `.templatamus/` metadata and conflict-record persistence
//! - [`config`]: `~/.templatamus` user config
//! - [`ports`]: collaborator traits (source repo, version control, prompts)
//! - [`error`]: [`StoreError`], [`SourceError`], [`VcsError`], [`PromptError`]

pub mod config;
pub mod error;
pub mod ports;
pub mod store;
pub mod types;

pub use config::UserConfig;
pub use error::{PromptError, SourceError, StoreError, VcsError};
pub use ports::{ApplyOutcome, CommitOutcome, CommitSource, Prompter, VersionControl};
pub use types::{AppliedCommits, CommitId, CommitInfo, ProjectMetadata, RepoSlug, SyncStatus};
