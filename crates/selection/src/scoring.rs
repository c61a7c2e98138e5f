//! Multi-factor priority scoring.
//!
//! A score is the weighted sum of five sub-scores, each in `[0, 1]`:
//! due-date urgency, importance, effort suitability, deep/shallow balance
//! and dependency readiness.

use std::collections::HashSet;

use ivy_core::{Constraints, Level, PriorityWeights, Task, TaskId, Time, WorkContext};
use serde::Serialize;

use crate::index;

/// Individual sub-scores behind a priority score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFactors {
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

impl ScoreFactors {
    /// Weighted sum of the factors.
    pub fn weighted(&self, weights: &PriorityWeights) -> f64 {
        self.due_date * weights.due_date
            + self.importance * weights.importance
            + self.effort * weights.effort
            + self.balance * weights.balance
            + self.dependencies * weights.dependencies
    }
}

/// Priority of one task in the context of the current selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityScore {
    /// Scored task
    pub task_id: TaskId,
    /// Weighted composite
    pub score: f64,
    /// Sub-scores
    pub factors: ScoreFactors,
}

/// Scores tasks against the selection policy.
#[derive(Debug, Clone, Copy)]
pub struct ScoringModel {
    constraints: Constraints,
    weights: PriorityWeights,
}

impl ScoringModel {
    /// Create a new scoring model.
    pub fn new(constraints: Constraints, weights: PriorityWeights) -> Self {
        Self { constraints, weights }
    }

    /// Score `task` given the pool and the current selection.
    pub fn score(&self, task: &Task, all_tasks: &[Task], selected: &[TaskId], now: Time) -> PriorityScore {
        let factors = ScoreFactors {
            due_date: due_date_score(task.due_date, now),
            importance: importance_score(task.importance),
            effort: effort_score(task.effort),
            balance: self.balance_score(task, all_tasks, selected),
            dependencies: readiness_score(task, all_tasks, selected),
        };

        PriorityScore {
            task_id: task.id.clone(),
            score: factors.weighted(&self.weights),
            factors,
        }
    }

    /// Deep/shallow balance of adding `task` to the selection.
    ///
    /// The task itself is left out of the counts so a selected task is
    /// judged against the rest of the selection.
    pub fn balance_score(&self, task: &Task, all_tasks: &[Task], selected: &[TaskId]) -> f64 {
        let pool = index(all_tasks);
        let (mut deep, mut shallow) = (0usize, 0usize);
        for id in selected.iter().filter(|id| **id != task.id) {
            match pool.get(id).map(|t| t.context) {
                Some(WorkContext::Deep) => deep += 1,
                Some(WorkContext::Shallow) => shallow += 1,
                None => {}
            }
        }

        let (own, other, ceiling) = match task.context {
            WorkContext::Deep => (deep, shallow, self.constraints.max_deep_work_tasks),
            WorkContext::Shallow => (shallow, deep, self.constraints.max_shallow_tasks),
        };

        if other > own + 1 {
            1.0
        } else if own >= ceiling {
            0.0
        } else {
            0.7
        }
    }
}

/// Whole days until `due`, rounded up; negative once a full day has passed.
pub fn days_until(due: Time, now: Time) -> i64 {
    let seconds = (due - now).num_seconds() as f64;
    (seconds / 86_400.0).ceil() as i64
}

/// Urgency of a due date relative to `now`.
pub fn due_date_score(due: Option<Time>, now: Time) -> f64 {
    let Some(due) = due else {
        return 0.3;
    };
    if due < now {
        return 1.0;
    }

    match days_until(due, now) {
        d if d <= 1 => 0.9,
        d if d <= 3 => 0.7,
        d if d <= 7 => 0.5,
        _ => 0.3,
    }
}

/// Importance sub-score.
pub fn importance_score(importance: Option<Level>) -> f64 {
    match importance {
        Some(Level::High) => 1.0,
        Some(Level::Medium) => 0.6,
        Some(Level::Low) => 0.3,
        None => 0.5,
    }
}

/// Effort suitability; medium-sized work is preferred.
pub fn effort_score(effort: Option<Level>) -> f64 {
    match effort {
        Some(Level::Medium) => 1.0,
        Some(Level::Low) => 0.6,
        Some(Level::High) => 0.4,
        None => 0.5,
    }
}

/// How far the task's prerequisites are already selected.
pub fn readiness_score(task: &Task, all_tasks: &[Task], selected: &[TaskId]) -> f64 {
    if task.dependencies.is_empty() {
        return 1.0;
    }

    let pool = index(all_tasks);
    if task.dependencies.iter().any(|d| !pool.contains_key(d)) {
        return 0.0;
    }

    let selected: HashSet<&TaskId> = selected.iter().collect();
    let unmet = task
        .dependencies
        .iter()
        .filter(|d| **d == task.id || !selected.contains(d))
        .count();

    if unmet == 0 {
        1.0
    } else {
        (1.0 - 0.3 * unmet as f64).max(0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{deep, ids, now, shallow, standard};
    use chrono::Duration;

    fn model() -> ScoringModel {
        ScoringModel::new(Constraints::default(), PriorityWeights::default())
    }

    #[test]
    fn test_due_date_buckets() {
        let now = now();
        assert_eq!(due_date_score(None, now), 0.3);
        assert_eq!(due_date_score(Some(now - Duration::hours(1)), now), 1.0);
        assert_eq!(due_date_score(Some(now + Duration::hours(3)), now), 0.9);
        assert_eq!(due_date_score(Some(now + Duration::days(1)), now), 0.9);
        assert_eq!(due_date_score(Some(now + Duration::days(2)), now), 0.7);
        assert_eq!(due_date_score(Some(now + Duration::days(3)), now), 0.7);
        assert_eq!(due_date_score(Some(now + Duration::days(5)), now), 0.5);
        assert_eq!(due_date_score(Some(now + Duration::days(7)), now), 0.5);
        assert_eq!(due_date_score(Some(now + Duration::days(8)), now), 0.3);
    }

    #[test]
    fn test_importance_and_effort_tables() {
        assert_eq!(importance_score(Some(Level::High)), 1.0);
        assert_eq!(importance_score(Some(Level::Medium)), 0.6);
        assert_eq!(importance_score(Some(Level::Low)), 0.3);
        assert_eq!(importance_score(None), 0.5);

        assert_eq!(effort_score(Some(Level::Medium)), 1.0);
        assert_eq!(effort_score(Some(Level::Low)), 0.6);
        assert_eq!(effort_score(Some(Level::High)), 0.4);
    }

    #[test]
    fn test_due_today_outranks_due_next_month() {
        let now = now();
        let today = standard("today").with_due_date(now + Duration::hours(6));
        let later = standard("later").with_due_date(now + Duration::days(30));
        let pool = vec![today.clone(), later.clone()];

        let a = model().score(&today, &pool, &[], now);
        let b = model().score(&later, &pool, &[], now);
        assert!(a.score > b.score);
        assert_eq!(a.factors.due_date, 0.9);
        assert_eq!(b.factors.due_date, 0.3);
    }

    #[test]
    fn test_composite_is_weighted_sum() {
        let now = now();
        let task = standard("a");
        let pool = vec![task.clone()];

        let score = model().score(&task, &pool, &[], now);
        // 0.3*0.30 + 1.0*0.25 + 1.0*0.20 + 0.7*0.15 + 1.0*0.10
        assert!((score.score - 0.745).abs() < 1e-9);
    }

    #[test]
    fn test_balance_prefers_under_represented_context() {
        let pool = vec![shallow("s1"), shallow("s2"), deep("d1"), deep("candidate")];
        let model = model();

        // two shallow vs zero deep: deep is behind by more than one
        let score = model.balance_score(&pool[3], &pool, &ids(&["s1", "s2"]));
        assert_eq!(score, 1.0);

        // one each: neutral
        let score = model.balance_score(&pool[3], &pool, &ids(&["s1", "d1"]));
        assert_eq!(score, 0.7);
    }

    #[test]
    fn test_balance_zero_at_ceiling() {
        let pool: Vec<_> = ["d1", "d2", "d3", "d4", "d5"].iter().map(|i| deep(i)).collect();
        let score = model().balance_score(&pool[4], &pool, &ids(&["d1", "d2", "d3", "d4"]));
        assert_eq!(score, 0.0);

        // an already-selected task is not counted against itself
        let score = model().balance_score(&pool[0], &pool, &ids(&["d1", "d2", "d3", "d4"]));
        assert_eq!(score, 0.7);
    }

    #[test]
    fn test_balance_under_representation_outranks_ceiling() {
        let pool = vec![deep("d1"), shallow("s1"), shallow("s2"), shallow("s3"), deep("candidate")];
        let model = ScoringModel::new(
            Constraints::default().with_context_limits(1, 4),
            PriorityWeights::default(),
        );

        // deep sits at its ceiling of one, but shallow leads by two
        let score = model.balance_score(&pool[4], &pool, &ids(&["d1", "s1", "s2", "s3"]));
        assert_eq!(score, 1.0);

        let score = model.balance_score(&pool[4], &pool, &ids(&["d1", "s1"]));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_readiness() {
        let pool = vec![
            deep("a").depends_on("b").depends_on("c"),
            deep("b"),
            deep("c"),
            deep("orphan").depends_on("missing"),
            deep("self").depends_on("self"),
        ];

        assert_eq!(readiness_score(&pool[1], &pool, &[]), 1.0);
        assert_eq!(readiness_score(&pool[0], &pool, &ids(&["b", "c"])), 1.0);
        assert!((readiness_score(&pool[0], &pool, &ids(&["b"])) - 0.7).abs() < 1e-9);
        assert!((readiness_score(&pool[0], &pool, &[]) - 0.4).abs() < 1e-9);
        assert_eq!(readiness_score(&pool[3], &pool, &[]), 0.0);
        assert!((readiness_score(&pool[4], &pool, &ids(&["self"])) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_readiness_floor() {
        let mut task = deep("many");
        let mut pool = Vec::new();
        for i in 0..5 {
            let id = format!("p{i}");
            task = task.depends_on(id.as_str());
            pool.push(deep(&id));
        }
        pool.push(task.clone());

        assert_eq!(readiness_score(&task, &pool, &[]), 0.2);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let now = now();
        let pool = vec![standard("a").with_due_date(now + Duration::days(2)), shallow("b")];
        let selected = ids(&["b"]);

        let first = model().score(&pool[0], &pool, &selected, now);
        let second = model().score(&pool[0], &pool, &selected, now);
        assert_eq!(first, second);
    }
}
