//! Ivy core data models.
//!
//! This crate defines the data structures shared by the selection engine,
//! snapshot storage and the CLI: tasks, the selection policy and scoring
//! weights, suggestion rules, and the caller-owned plan snapshot.

#![warn(missing_docs)]

// Core identities
mod id;

// Tasks and the day's plan
mod task;
mod snapshot;

// Engine configuration
mod config;
mod rule;

// Re-exports
pub use id::TaskId;

pub use task::{find_task, Level, Task, WorkContext, DEFAULT_ESTIMATED_DURATION};
pub use snapshot::{PlanSnapshot, SnapshotError};

pub use config::{
    ConfigError, Constraints, EngineConfig, PriorityWeights, DEEP_WORK_CEILING_MINUTES,
    DEFAULT_RECOMMENDED_TASKS,
};
pub use rule::{Comparator, Rule, RuleField, RuleValue};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
