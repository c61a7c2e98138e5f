//! Selection constraint checks.

use std::collections::HashSet;

use ivy_core::{Constraints, Task, TaskId, WorkContext};

use crate::index;

/// Checks a selection against the capacity rules.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintValidator {
    constraints: Constraints,
}

impl ConstraintValidator {
    /// Create a new validator.
    pub fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    /// All violations of the selection, empty when valid.
    ///
    /// Every check runs regardless of earlier failures. Selected ids that
    /// are not in the pool count toward the size checks only.
    pub fn validate(&self, all_tasks: &[Task], selected: &[TaskId]) -> Vec<String> {
        let c = &self.constraints;
        let pool = index(all_tasks);
        let chosen: Vec<&Task> = selected.iter().filter_map(|id| pool.get(id).copied()).collect();
        let mut violations = Vec::new();

        if selected.len() > c.max_tasks {
            violations.push(format!(
                "Too many tasks selected: {} (maximum {})",
                selected.len(),
                c.max_tasks
            ));
        }

        if !selected.is_empty() && selected.len() < c.min_tasks {
            violations.push(format!(
                "Too few tasks selected: {} (minimum {})",
                selected.len(),
                c.min_tasks
            ));
        }

        let deep = chosen.iter().filter(|t| t.context == WorkContext::Deep).count();
        if deep > c.max_deep_work_tasks {
            violations.push(format!(
                "Too many deep work tasks: {} (maximum {})",
                deep, c.max_deep_work_tasks
            ));
        }

        let shallow = chosen.iter().filter(|t| t.context == WorkContext::Shallow).count();
        if shallow > c.max_shallow_tasks {
            violations.push(format!(
                "Too many shallow work tasks: {} (maximum {})",
                shallow, c.max_shallow_tasks
            ));
        }

        let total: u64 = chosen.iter().map(|t| u64::from(t.estimated_duration)).sum();
        if total > u64::from(c.max_daily_effort) {
            violations.push(format!(
                "Daily effort of {} minutes exceeds the maximum of {} minutes",
                total, c.max_daily_effort
            ));
        }

        let selected_set: HashSet<&TaskId> = selected.iter().collect();
        for task in &chosen {
            let missing: Vec<&str> = task
                .dependencies
                .iter()
                .filter(|d| **d == task.id || !selected_set.contains(d))
                .map(|d| pool.get(d).map(|t| t.title.as_str()).unwrap_or(d.as_str()))
                .collect();

            if !missing.is_empty() {
                violations.push(format!(
                    "\"{}\" is missing prerequisites: {}",
                    task.title,
                    missing.join(", ")
                ));
            }
        }

        violations
    }
}
