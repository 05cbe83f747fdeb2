//! # templatamus-git
//!
//! `git` subprocess implementation of the [`VersionControl`] collaborator.
//!
//! Patches go through `git apply --reject`; hunks that do not apply leave
//! `*.rej` files next to their targets. Those files are the only conflict
//! signal, and they stay inside this crate: callers see
//! [`ApplyOutcome::Conflict`].
//!
//! [`VersionControl`]: templatamus_core::ports::VersionControl
//! [`ApplyOutcome::Conflict`]: templatamus_core::ports::ApplyOutcome::Conflict

mod cli;

pub use cli::GitCli;
