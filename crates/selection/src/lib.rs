//! Selection layer - scoring, dependency resolution, constraint checks and
//! capacity estimation for picking the day's tasks.
//!
//! Every operation is a pure computation over the task pool and selection
//! passed in; nothing is retained between calls.

#![warn(missing_docs)]

use std::collections::HashMap;

use ivy_core::{Task, TaskId};

pub mod clock;
pub mod scoring;
pub mod dependency;
pub mod validator;
pub mod capacity;
pub mod rules;
pub mod engine;

pub use clock::Clock;
pub use scoring::{PriorityScore, ScoreFactors, ScoringModel};
pub use dependency::{DependencyInfo, DependencyOrder, DependencyResolver};
pub use validator::ConstraintValidator;
pub use capacity::{CapacityEstimate, CapacityEstimator};
pub use engine::{SelectionEngine, SelectionState, Suggestion, MAX_SUGGESTIONS};

/// Index a task pool by id. The first task wins on duplicate ids.
pub(crate) fn index(tasks: &[Task]) -> HashMap<&TaskId, &Task> {
    let mut map = HashMap::with_capacity(tasks.len());
    for task in tasks {
        map.entry(&task.id).or_insert(task);
    }
    map
}
