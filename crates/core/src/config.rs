//! Engine configuration - selection policy and scoring weights.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rule::Rule;

/// Deep-work minutes above which a day is considered overloaded.
pub const DEEP_WORK_CEILING_MINUTES: u32 = 240;

/// Task count the Ivy-6 method recommends by default.
pub const DEFAULT_RECOMMENDED_TASKS: usize = 6;

/// Capacity rules a selection is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Constraints {
    /// Maximum number of selected tasks
    pub max_tasks: usize,

    /// Minimum number of selected tasks (only checked for non-empty selections)
    pub min_tasks: usize,

    /// Maximum number of `@deep` tasks
    pub max_deep_work_tasks: usize,

    /// Maximum number of `@shallow` tasks
    pub max_shallow_tasks: usize,

    /// Daily effort budget in minutes
    pub max_daily_effort: u32,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_tasks: 6,
            min_tasks: 1,
            max_deep_work_tasks: 4,
            max_shallow_tasks: 4,
            max_daily_effort: 480,
        }
    }
}

impl Constraints {
    /// Create the default Ivy-6 constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum task count.
    pub fn with_max_tasks(mut self, max: usize) -> Self {
        self.max_tasks = max;
        self
    }

    /// Set the minimum task count.
    pub fn with_min_tasks(mut self, min: usize) -> Self {
        self.min_tasks = min;
        self
    }

    /// Set the `@deep` and `@shallow` ceilings.
    pub fn with_context_limits(mut self, deep: usize, shallow: usize) -> Self {
        self.max_deep_work_tasks = deep;
        self.max_shallow_tasks = shallow;
        self
    }

    /// Set the daily effort budget in minutes.
    pub fn with_max_daily_effort(mut self, minutes: u32) -> Self {
        self.max_daily_effort = minutes;
        self
    }
}

/// Weights of the priority sub-scores.
///
/// Weights are used as given; callers are expected to supply values that
/// sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriorityWeights {
    /// Due-date urgency
    pub due_date: f64,
    /// Importance
    pub importance: f64,
    /// Effort suitability
    pub effort: f64,
    /// Deep/shallow balance
    pub balance: f64,
    /// Dependency readiness
    pub dependencies: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            due_date: 0.30,
            importance: 0.25,
            effort: 0.20,
            balance: 0.15,
            dependencies: 0.10,
        }
    }
}

impl PriorityWeights {
    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.due_date + self.importance + self.effort + self.balance + self.dependencies
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("dueDate", self.due_date),
            ("importance", self.importance),
            ("effort", self.effort),
            ("balance", self.balance),
            ("dependencies", self.dependencies),
        ]
        .into_iter()
    }
}

/// Errors in a caller-supplied configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// `max_tasks` is zero
    #[error("maxTasks must be at least 1")]
    ZeroMaxTasks,

    /// `min_tasks` exceeds `max_tasks`
    #[error("minTasks ({min}) is greater than maxTasks ({max})")]
    MinAboveMax {
        /// Configured minimum
        min: usize,
        /// Configured maximum
        max: usize,
    },

    /// A weight is negative or not a number
    #[error("weight {name} must be a finite, non-negative number (got {value})")]
    InvalidWeight {
        /// Weight name
        name: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Full configuration of a selection engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Selection policy
    pub constraints: Constraints,

    /// Scoring weights
    pub weights: PriorityWeights,

    /// Filters every suggestion must pass
    pub suggestion_rules: Vec<Rule>,
}

impl EngineConfig {
    /// Check the configuration for values no engine can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.constraints;
        if c.max_tasks == 0 {
            return Err(ConfigError::ZeroMaxTasks);
        }
        if c.min_tasks > c.max_tasks {
            return Err(ConfigError::MinAboveMax { min: c.min_tasks, max: c.max_tasks });
        }
        for (name, value) in self.weights.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints() {
        let c = Constraints::default();
        assert_eq!(c.max_tasks, 6);
        assert_eq!(c.min_tasks, 1);
        assert_eq!(c.max_deep_work_tasks, 4);
        assert_eq!(c.max_shallow_tasks, 4);
        assert_eq!(c.max_daily_effort, 480);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = PriorityWeights::default();
        assert!((w.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let json = r#"{ "constraints": { "maxTasks": 3 }, "weights": { "importance": 0.5 } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.constraints.max_tasks, 3);
        assert_eq!(config.constraints.max_daily_effort, 480);
        assert_eq!(config.weights.importance, 0.5);
        assert_eq!(config.weights.due_date, 0.30);
        assert!(config.suggestion_rules.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());

        config.constraints.max_tasks = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxTasks));

        config.constraints = Constraints::default().with_min_tasks(7);
        assert_eq!(config.validate(), Err(ConfigError::MinAboveMax { min: 7, max: 6 }));

        config.constraints = Constraints::default();
        config.weights.balance = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeight { name: "balance", .. })
        ));
    }
}
