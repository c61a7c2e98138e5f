//! Daily capacity estimation.

use ivy_core::{Constraints, Task, WorkContext, DEEP_WORK_CEILING_MINUTES, DEFAULT_RECOMMENDED_TASKS};
use serde::Serialize;

/// Effort summary of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityEstimate {
    /// Total planned minutes
    pub total_minutes: u64,
    /// Minutes of `@deep` work
    pub deep_work_minutes: u64,
    /// Minutes of `@shallow` work
    pub shallow_work_minutes: u64,
    /// Number of tasks the day can realistically hold
    pub recommended_task_count: usize,
    /// Overcommitment warnings
    pub warnings: Vec<String>,
}

/// Estimates whether a selection fits in a day.
#[derive(Debug, Clone, Copy)]
pub struct CapacityEstimator {
    constraints: Constraints,
}

impl CapacityEstimator {
    /// Create a new estimator.
    pub fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    /// Estimate capacity for the selected tasks.
    pub fn estimate<'a>(&self, selected: impl IntoIterator<Item = &'a Task>) -> CapacityEstimate {
        let (mut deep_minutes, mut shallow_minutes) = (0u64, 0u64);
        let (mut count, mut deep_count) = (0usize, 0usize);

        for task in selected {
            count += 1;
            match task.context {
                WorkContext::Deep => {
                    deep_count += 1;
                    deep_minutes += u64::from(task.estimated_duration);
                }
                WorkContext::Shallow => shallow_minutes += u64::from(task.estimated_duration),
            }
        }

        let total = deep_minutes + shallow_minutes;
        let mut warnings = Vec::new();

        if deep_minutes > u64::from(DEEP_WORK_CEILING_MINUTES) {
            warnings.push(format!(
                "Deep work totals {} minutes, above the {}-minute ceiling for focused work",
                deep_minutes, DEEP_WORK_CEILING_MINUTES
            ));
        }

        if total > u64::from(self.constraints.max_daily_effort) {
            warnings.push(format!(
                "Planned work totals {} minutes, over the daily capacity of {} minutes",
                total, self.constraints.max_daily_effort
            ));
        }

        let mut recommended = DEFAULT_RECOMMENDED_TASKS;
        if count > 0 {
            let average = total as f64 / count as f64;
            let deep_share = deep_count as f64 / count as f64;

            if average > 60.0 && deep_share > 0.5 {
                recommended = 4;
                warnings.push(format!(
                    "Tasks average {:.0} minutes and are mostly deep work; consider limiting today to {} tasks",
                    average, recommended
                ));
            } else if average < 30.0 && deep_share < 0.3 {
                recommended = 8;
            }
        }

        CapacityEstimate {
            total_minutes: total,
            deep_work_minutes: deep_minutes,
            shallow_work_minutes: shallow_minutes,
            recommended_task_count: recommended.min(self.constraints.max_tasks),
            warnings,
        }
    }
}
