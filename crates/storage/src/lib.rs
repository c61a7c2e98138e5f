//! Snapshot storage for Ivy.
//!
//! The selection engine keeps no state; callers persist their
//! [`PlanSnapshot`](ivy_core::PlanSnapshot) through the [`SnapshotStore`]
//! trait. A JSON file implementation is provided.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;

pub use trait_::{SnapshotStore, StorageError, Result};
pub use json_storage::JsonSnapshotStore;
