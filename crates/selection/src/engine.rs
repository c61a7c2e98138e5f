//! The selection engine - composes scoring, dependency resolution,
//! constraint checks and capacity estimation.
//!
//! ```text
//! pool + selection ─► score ─► suggest / validate / order / estimate
//! ```
//!
//! The engine only holds configuration. Every call recomputes from the
//! task pool and selection it is given.

use std::collections::HashSet;

use ivy_core::{Constraints, EngineConfig, PriorityWeights, Rule, Task, TaskId, WorkContext};
use serde::Serialize;
use tracing::debug;

use crate::capacity::{CapacityEstimate, CapacityEstimator};
use crate::dependency::{DependencyInfo, DependencyOrder, DependencyResolver};
use crate::rules::all_match;
use crate::scoring::{PriorityScore, ScoringModel};
use crate::validator::ConstraintValidator;
use crate::{index, Clock};

/// Upper bound on suggestions returned at once.
pub const MAX_SUGGESTIONS: usize = 5;

/// A candidate worth adding to the selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Suggested task
    pub task_id: TaskId,
    /// Its title
    pub title: String,
    /// Score in the context of the current selection
    pub score: PriorityScore,
    /// Why it ranks well
    pub reasons: Vec<String>,
}

/// Everything a view needs after a selection change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    /// A score for every task in the pool, in pool order
    pub scores: Vec<PriorityScore>,
    /// Constraint violations of the current selection
    pub violations: Vec<String>,
    /// Best next additions
    pub suggestions: Vec<Suggestion>,
    /// Slots left before `max_tasks`
    pub remaining_slots: usize,
    /// Capacity summary of the current selection
    pub capacity: CapacityEstimate,
    /// Whether there are no violations
    pub is_valid: bool,
}

/// Stateless facade over the selection components.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    constraints: Constraints,
    weights: PriorityWeights,
    rules: Vec<Rule>,
    clock: Clock,
    scoring: ScoringModel,
    resolver: DependencyResolver,
    validator: ConstraintValidator,
    estimator: CapacityEstimator,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(Constraints::default(), PriorityWeights::default())
    }
}

impl SelectionEngine {
    /// Create a new engine for one selection policy.
    pub fn new(constraints: Constraints, weights: PriorityWeights) -> Self {
        Self {
            constraints,
            weights,
            rules: Vec::new(),
            clock: Clock::System,
            scoring: ScoringModel::new(constraints, weights),
            resolver: DependencyResolver::new(),
            validator: ConstraintValidator::new(constraints),
            estimator: CapacityEstimator::new(constraints),
        }
    }

    /// Create an engine from a full configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self::new(config.constraints, config.weights).with_rules(config.suggestion_rules)
    }

    /// Set the clock used for due-date urgency.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Set the rules every suggestion must satisfy.
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    /// The selection policy.
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// The scoring weights.
    pub fn weights(&self) -> &PriorityWeights {
        &self.weights
    }

    /// Score every task in the pool against the current selection.
    pub fn calculate_priority_scores(&self, tasks: &[Task], selected: &[TaskId]) -> Vec<PriorityScore> {
        let now = self.clock.now();
        let scores: Vec<_> = tasks
            .iter()
            .map(|t| self.scoring.score(t, tasks, selected, now))
            .collect();
        debug!("Scored {} tasks against {} selected", scores.len(), selected.len());
        scores
    }

    /// Best unselected candidates, at most one per free slot and never more
    /// than [`MAX_SUGGESTIONS`].
    ///
    /// Candidates must have every prerequisite selected, fit under their
    /// context ceiling and the daily effort budget, and pass the configured
    /// rules.
    pub fn get_suggestions(&self, tasks: &[Task], selected: &[TaskId]) -> Vec<Suggestion> {
        let limit = self.remaining_slots(selected).min(MAX_SUGGESTIONS);
        if limit == 0 {
            return Vec::new();
        }

        let now = self.clock.now();
        let pool = index(tasks);
        let selected_set: HashSet<&TaskId> = selected.iter().collect();
        let chosen: Vec<&Task> = selected.iter().filter_map(|id| pool.get(id).copied()).collect();

        let used_minutes: u64 = chosen.iter().map(|t| u64::from(t.estimated_duration)).sum();
        let deep = chosen.iter().filter(|t| t.is_deep()).count();
        let shallow = chosen.len() - deep;

        let mut ranked: Vec<(usize, &Task, PriorityScore)> = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| !selected_set.contains(&t.id))
            .filter(|(_, t)| {
                t.dependencies
                    .iter()
                    .all(|d| *d != t.id && selected_set.contains(d))
            })
            .filter(|(_, t)| {
                let (count, ceiling) = match t.context {
                    WorkContext::Deep => (deep, self.constraints.max_deep_work_tasks),
                    WorkContext::Shallow => (shallow, self.constraints.max_shallow_tasks),
                };
                count < ceiling
                    && used_minutes + u64::from(t.estimated_duration)
                        <= u64::from(self.constraints.max_daily_effort)
            })
            .filter(|(_, t)| all_match(&self.rules, t, now))
            .map(|(i, t)| (i, t, self.scoring.score(t, tasks, selected, now)))
            .collect();

        ranked.sort_by(|a, b| b.2.score.total_cmp(&a.2.score).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);

        debug!("Suggesting {} of {} candidates", ranked.len(), tasks.len());

        ranked
            .into_iter()
            .map(|(_, task, score)| Suggestion {
                task_id: task.id.clone(),
                title: task.title.clone(),
                reasons: reasons(task, &score),
                score,
            })
            .collect()
    }

    /// Selected tasks in the order they should be worked on.
    ///
    /// Dependencies come first; among tasks whose dependencies are met,
    /// deep work and important work lead.
    pub fn get_optimal_task_order(&self, tasks: &[Task], selected: &[TaskId]) -> Vec<Task> {
        self.working_order(tasks, selected).ordered
    }

    /// Working order of the selection together with the selected tasks that
    /// were left out because they sit on, or depend on, a cycle.
    pub fn working_order(&self, tasks: &[Task], selected: &[TaskId]) -> DependencyOrder {
        let chosen = self.selected_tasks(tasks, selected);
        let DependencyOrder { ordered, excluded } = self.resolver.resolve(&chosen);
        DependencyOrder {
            ordered: self.resolver.energy_order(ordered),
            excluded,
        }
    }

    /// Constraint violations of the selection, empty when valid.
    pub fn validate_selection(&self, tasks: &[Task], selected: &[TaskId]) -> Vec<String> {
        self.validator.validate(tasks, selected)
    }

    /// Capacity summary of the selection.
    pub fn estimate_capacity(&self, tasks: &[Task], selected: &[TaskId]) -> CapacityEstimate {
        let pool = index(tasks);
        self.estimator
            .estimate(selected.iter().filter_map(|id| pool.get(id).copied()))
    }

    /// Prerequisites and dependents of a single task.
    pub fn detect_dependencies(&self, tasks: &[Task], target: &TaskId) -> DependencyInfo {
        self.resolver.detect_dependencies(tasks, target)
    }

    /// Scores, violations, suggestions and capacity in one snapshot.
    pub fn get_selection_state(&self, tasks: &[Task], selected: &[TaskId]) -> SelectionState {
        let violations = self.validate_selection(tasks, selected);
        SelectionState {
            scores: self.calculate_priority_scores(tasks, selected),
            is_valid: violations.is_empty(),
            violations,
            suggestions: self.get_suggestions(tasks, selected),
            remaining_slots: self.remaining_slots(selected),
            capacity: self.estimate_capacity(tasks, selected),
        }
    }

    /// Free slots before `max_tasks` is reached.
    pub fn remaining_slots(&self, selected: &[TaskId]) -> usize {
        self.constraints.max_tasks.saturating_sub(selected.len())
    }

    fn selected_tasks(&self, tasks: &[Task], selected: &[TaskId]) -> Vec<Task> {
        let pool = index(tasks);
        selected
            .iter()
            .filter_map(|id| pool.get(id).map(|t| (*t).clone()))
            .collect()
    }
}

fn reasons(task: &Task, score: &PriorityScore) -> Vec<String> {
    let f = &score.factors;
    let mut reasons = Vec::new();

    if f.due_date >= 1.0 {
        reasons.push("Overdue".to_string());
    } else if f.due_date >= 0.9 {
        reasons.push("Due within a day".to_string());
    } else if f.due_date >= 0.7 {
        reasons.push("Due within three days".to_string());
    }
    if f.importance >= 1.0 {
        reasons.push("High importance".to_string());
    }
    if f.effort >= 1.0 {
        reasons.push("Manageable effort".to_string());
    }
    if f.balance >= 1.0 {
        reasons.push(format!("Balances the day: {} work is under-represented", task.context));
    }
    if !task.dependencies.is_empty() && f.dependencies >= 1.0 {
        reasons.push("All prerequisites selected".to_string());
    }

    reasons
}
