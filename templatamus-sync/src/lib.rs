//! # templatamus-sync
//!
//! Reconciliation, conflict state machine, and the selection/apply driver.
//!
//! [`Syncer::run`] performs one sync of a tracked project: settle an open
//! conflict if there is one, otherwise reconcile upstream history against
//! `.templatamus/metadata.json`, let the operator pick commits, and apply them
//! oldest first until one conflicts.
//!
//! Runs are sequential and blocking. Nothing locks the project directory:
//! two runs against the same project at the same time are undefined behavior.

pub mod driver;
pub mod error;
pub mod machine;
pub mod reconcile;

pub use driver::{commit_label, fetch_history, SyncOptions, SyncOutcome, Syncer};
pub use error::SyncError;
pub use machine::{load_state, Resolution, SyncState};
pub use reconcile::{reconcile, Anchor, Reconciliation};
