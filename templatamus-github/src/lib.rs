//! # templatamus-github
//!
//! GitHub REST implementation of the [`CommitSource`] collaborator, plus the
//! branch/tag/default-branch lookups used when adopting a project.
//!
//! [`CommitSource`]: templatamus_core::ports::CommitSource

mod client;
mod wire;

pub use client::GitHubClient;
