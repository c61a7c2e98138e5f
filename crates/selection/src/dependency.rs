//! Dependency resolution for tasks.

use std::collections::{HashMap, HashSet};

use ivy_core::{Task, TaskId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::index;

/// Result of ordering a task set by its dependencies.
#[derive(Debug, Clone, Default)]
pub struct DependencyOrder {
    /// Tasks with every prerequisite before its dependents
    pub ordered: Vec<Task>,
    /// Tasks left out because they sit on, or depend on, a cycle
    pub excluded: Vec<TaskId>,
}

/// Dependency relationships of a single task.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    /// Declared prerequisites found in the pool
    pub prerequisites: Vec<Task>,
    /// Tasks that declare this one as a prerequisite
    pub dependents: Vec<Task>,
    /// Whether every declared prerequisite exists in the pool
    pub can_be_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
    Excluded,
}

/// Resolves task dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyResolver;

impl DependencyResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Tasks in topological order; cyclic chains are dropped.
    pub fn topological_order(&self, tasks: &[Task]) -> Vec<Task> {
        self.resolve(tasks).ordered
    }

    /// Depth-first topological sort with three-colour cycle detection.
    ///
    /// Uses an explicit stack of `(node, next dependency)` frames. Only
    /// dependencies that resolve inside `tasks` are edges. When a node that
    /// is still in progress is reached again, the whole chain on the stack
    /// is excluded, and so is anything that later reaches an excluded node.
    pub fn resolve(&self, tasks: &[Task]) -> DependencyOrder {
        let positions: HashMap<&TaskId, usize> = tasks
            .iter()
            .enumerate()
            .rev()
            .map(|(i, t)| (&t.id, i))
            .collect();

        let edges: Vec<Vec<usize>> = tasks
            .iter()
            .map(|t| {
                t.dependencies
                    .iter()
                    .filter_map(|d| positions.get(d).copied())
                    .collect()
            })
            .collect();

        let mut marks: Vec<Option<Mark>> = vec![None; tasks.len()];
        let mut finished = Vec::with_capacity(tasks.len());
        let mut excluded = Vec::new();

        for root in 0..tasks.len() {
            if marks[root].is_some() {
                continue;
            }

            marks[root] = Some(Mark::InProgress);
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let Some(&next) = edges[node].get(frame.1) else {
                    marks[node] = Some(Mark::Done);
                    finished.push(node);
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                match marks[next] {
                    None => {
                        marks[next] = Some(Mark::InProgress);
                        stack.push((next, 0));
                    }
                    Some(Mark::Done) => {}
                    Some(mark) => {
                        if mark == Mark::InProgress {
                            let start = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                            let cycle: Vec<&str> = stack[start..]
                                .iter()
                                .map(|(n, _)| tasks[*n].id.as_str())
                                .collect();
                            warn!("Dependency cycle detected: {} -> {}", cycle.join(" -> "), tasks[next].id);
                        } else {
                            debug!("Task {} depends on excluded task {}", tasks[node].id, tasks[next].id);
                        }

                        for (n, _) in stack.drain(..) {
                            marks[n] = Some(Mark::Excluded);
                            excluded.push(tasks[n].id.clone());
                        }
                    }
                }
            }
        }

        DependencyOrder {
            ordered: finished.into_iter().map(|i| tasks[i].clone()).collect(),
            excluded,
        }
    }

    /// Regroup a topological ordering into levels by available energy.
    ///
    /// A level holds every remaining task whose dependencies were emitted in
    /// an earlier level or are not part of `ordered` at all. Within a level
    /// deep work comes first, then higher importance.
    pub fn energy_order(&self, ordered: Vec<Task>) -> Vec<Task> {
        let pool: HashSet<TaskId> = ordered.iter().map(|t| t.id.clone()).collect();
        let mut emitted: HashSet<TaskId> = HashSet::with_capacity(pool.len());
        let mut result = Vec::with_capacity(ordered.len());
        let mut remaining = ordered;

        while !remaining.is_empty() {
            let (mut level, rest): (Vec<Task>, Vec<Task>) = remaining.into_iter().partition(|t| {
                t.dependencies
                    .iter()
                    .all(|d| emitted.contains(d) || !pool.contains(d))
            });

            if level.is_empty() {
                result.extend(rest);
                break;
            }

            level.sort_by(|a, b| {
                b.is_deep()
                    .cmp(&a.is_deep())
                    .then_with(|| b.importance.cmp(&a.importance))
            });
            emitted.extend(level.iter().map(|t| t.id.clone()));
            result.extend(level);
            remaining = rest;
        }

        result
    }

    /// Direct prerequisites and dependents of `target` within `tasks`.
    pub fn detect_dependencies(&self, tasks: &[Task], target: &TaskId) -> DependencyInfo {
        let pool = index(tasks);
        let Some(task) = pool.get(target) else {
            return DependencyInfo::default();
        };

        let prerequisites = task
            .dependencies
            .iter()
            .filter_map(|d| pool.get(d).map(|t| (*t).clone()))
            .collect();

        let dependents = tasks
            .iter()
            .filter(|t| t.id != *target && t.dependencies.contains(target))
            .cloned()
            .collect();

        let can_be_completed = !task.depends_on_itself()
            && task.dependencies.iter().all(|d| pool.contains_key(d));

        DependencyInfo {
            prerequisites,
            dependents,
            can_be_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{deep, shallow};
    use ivy_core::Level;

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn position(tasks: &[Task], id: &str) -> usize {
        tasks.iter().position(|t| t.id.as_str() == id).unwrap()
    }

    #[test]
    fn test_topological_order_places_dependencies_first() {
        let tasks = vec![
            deep("report").depends_on("data").depends_on("outline"),
            deep("data").depends_on("access"),
            shallow("outline"),
            shallow("access"),
            deep("review").depends_on("report"),
        ];

        let ordered = DependencyResolver::new().topological_order(&tasks);
        assert_eq!(ordered.len(), tasks.len());

        for task in &tasks {
            for dep in &task.dependencies {
                assert!(position(&ordered, dep.as_str()) < position(&ordered, task.id.as_str()));
            }
        }
    }

    fn assert_sound(tasks: &[Task]) {
        let ordered = DependencyResolver::new().topological_order(tasks);
        assert_eq!(ordered.len(), tasks.len());
        for task in tasks {
            for dep in &task.dependencies {
                assert!(
                    position(&ordered, dep.as_str()) < position(&ordered, task.id.as_str()),
                    "{} placed before its prerequisite {}",
                    task.id,
                    dep
                );
            }
        }
    }

    #[test]
    fn test_topological_order_sound_on_varied_shapes() {
        let diamond = vec![
            deep("top").depends_on("left").depends_on("right"),
            deep("left").depends_on("base"),
            shallow("right").depends_on("base"),
            shallow("base"),
        ];
        assert_sound(&diamond);

        let mut fan_in = vec![deep("sink")];
        for i in 0..6 {
            fan_in[0] = fan_in[0].clone().depends_on(format!("src{i}"));
            fan_in.push(shallow(&format!("src{i}")));
        }
        assert_sound(&fan_in);

        // edges only point at lower indices, so every graph is acyclic
        for seed in 1..=8usize {
            let n = 20;
            let mut tasks: Vec<Task> = (0..n)
                .map(|i| {
                    (0..i)
                        .filter(|j| (i * 31 + j * 17 + seed * 7) % 5 == 0)
                        .fold(deep(&format!("g{i}")), |t, j| t.depends_on(format!("g{j}")))
                })
                .collect();
            tasks.rotate_left(seed * 3 % n);
            if seed % 2 == 1 {
                tasks.reverse();
            }
            assert_sound(&tasks);
        }
    }

    #[test]
    fn test_topological_order_is_deterministic() {
        let tasks = vec![deep("a").depends_on("b"), deep("b"), shallow("c")];
        let resolver = DependencyResolver::new();

        assert_eq!(ids(&resolver.topological_order(&tasks)), vec!["b", "a", "c"]);
        assert_eq!(
            ids(&resolver.topological_order(&tasks)),
            ids(&resolver.topological_order(&tasks))
        );
    }

    #[test]
    fn test_two_cycle_is_excluded() {
        let tasks = vec![
            deep("a").depends_on("b"),
            deep("b").depends_on("a"),
            shallow("free"),
        ];

        let order = DependencyResolver::new().resolve(&tasks);
        assert_eq!(ids(&order.ordered), vec!["free"]);
        assert_eq!(order.excluded.len(), 2);
    }

    #[test]
    fn test_self_loop_terminates() {
        let tasks = vec![deep("loop").depends_on("loop"), shallow("ok")];

        let order = DependencyResolver::new().resolve(&tasks);
        assert_eq!(ids(&order.ordered), vec!["ok"]);
        assert_eq!(order.excluded, vec![TaskId::from("loop")]);
    }

    #[test]
    fn test_dependents_of_cycle_are_excluded_but_prerequisites_kept() {
        let tasks = vec![
            deep("top").depends_on("x"),
            deep("x").depends_on("y"),
            deep("y").depends_on("base").depends_on("x"),
            shallow("base"),
            shallow("late").depends_on("y"),
        ];

        let order = DependencyResolver::new().resolve(&tasks);
        assert_eq!(ids(&order.ordered), vec!["base"]);
        for id in ["top", "x", "y", "late"] {
            assert!(order.excluded.contains(&TaskId::from(id)));
        }
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut tasks: Vec<Task> = (0..5_000)
            .map(|i| deep(&format!("t{i}")).depends_on(format!("t{}", i + 1)))
            .collect();
        tasks.push(deep("t5000"));

        let ordered = DependencyResolver::new().topological_order(&tasks);
        assert_eq!(ordered.len(), 5_001);
        assert_eq!(ordered[0].id.as_str(), "t5000");
        assert_eq!(ordered[5_000].id.as_str(), "t0");
    }

    #[test]
    fn test_energy_order_levels() {
        let tasks = vec![
            shallow("email").with_importance(Level::High),
            deep("draft").with_importance(Level::Low),
            deep("design").with_importance(Level::High),
            shallow("send").depends_on("draft"),
            deep("polish").depends_on("draft").with_importance(Level::Medium),
        ];

        let resolver = DependencyResolver::new();
        let ordered = resolver.energy_order(resolver.topological_order(&tasks));
        // level 1: design, draft (deep, by importance), email; level 2: polish, send
        assert_eq!(ids(&ordered), vec!["design", "draft", "email", "polish", "send"]);
    }

    #[test]
    fn test_energy_order_puts_missing_importance_last() {
        let tasks = vec![
            deep("unrated"),
            shallow("errand").with_importance(Level::High),
            deep("minor").with_importance(Level::Low),
            deep("major").with_importance(Level::High),
        ];

        let resolver = DependencyResolver::new();
        let ordered = resolver.energy_order(resolver.topological_order(&tasks));
        assert_eq!(ids(&ordered), vec!["major", "minor", "unrated", "errand"]);
    }

    #[test]
    fn test_energy_order_treats_missing_dependencies_as_met() {
        let tasks = vec![shallow("a"), deep("b").depends_on("not-selected")];

        let resolver = DependencyResolver::new();
        let ordered = resolver.energy_order(resolver.topological_order(&tasks));
        assert_eq!(ids(&ordered), vec!["b", "a"]);
    }

    #[test]
    fn test_detect_dependencies() {
        let tasks = vec![
            deep("a").depends_on("b").depends_on("ghost"),
            deep("b"),
            shallow("c").depends_on("b"),
        ];
        let resolver = DependencyResolver::new();

        let info = resolver.detect_dependencies(&tasks, &"a".into());
        assert_eq!(ids(&info.prerequisites), vec!["b"]);
        assert!(info.dependents.is_empty());
        assert!(!info.can_be_completed);

        let info = resolver.detect_dependencies(&tasks, &"b".into());
        assert!(info.prerequisites.is_empty());
        assert_eq!(ids(&info.dependents), vec!["a", "c"]);
        assert!(info.can_be_completed);

        let info = resolver.detect_dependencies(&tasks, &"unknown".into());
        assert!(info.prerequisites.is_empty());
        assert!(!info.can_be_completed);
    }

    #[test]
    fn test_detect_self_dependency_cannot_complete() {
        let tasks = vec![deep("me").depends_on("me")];
        let info = DependencyResolver::new().detect_dependencies(&tasks, &"me".into());
        assert!(!info.can_be_completed);
        assert!(info.dependents.is_empty());
    }
}
