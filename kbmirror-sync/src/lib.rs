//! # kbmirror-sync
//!
//! Reconciliation planning and execution.
//!
//! Call [`pipeline::run_manifest`] to converge a destination to a manifest
//! (with new content taken from a staging area), or [`pipeline::run_tree`]
//! to mirror one live directory onto another. Both build a [`Plan`] and hand
//! it to [`execute`], which honours dry-run mode and never aborts on a
//! single failed action.

pub mod compare;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod pipeline;
pub mod plan;
pub mod planner;
pub mod preview;
pub mod scan;
pub mod treediff;

pub use error::SyncError;
pub use executor::{execute, ActionOutcome, ExecutionReport};
pub use fetch::{FetchItem, FetchReason};
pub use plan::{Action, Plan, RunMode, TransferKind};
pub use planner::{plan_manifest, plan_tree};
pub use preview::FileDiff;
