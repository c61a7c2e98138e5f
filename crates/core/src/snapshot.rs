//! Versioned plan snapshot owned by the caller.
//!
//! The engine is stateless; whoever drives it keeps the task pool and the
//! ordered selection here and hands both to every engine call. Every
//! mutation returns a new snapshot with a bumped version, so a stale copy
//! can be detected when it is written back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::TaskId;
use crate::task::{find_task, Task};
use crate::Time;

/// Errors from snapshot mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The id is not in the task pool
    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),

    /// The task is already part of the selection
    #[error("Task already selected: {0}")]
    AlreadySelected(TaskId),

    /// The task is not part of the selection
    #[error("Task not selected: {0}")]
    NotSelected(TaskId),

    /// A task with the same id already exists
    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),
}

/// Task pool plus ordered selection at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    /// Monotonic version, bumped on every mutation
    pub version: u64,

    /// All candidate tasks
    pub tasks: Vec<Task>,

    /// Selected ids; position 0 is the frog
    pub selected: Vec<TaskId>,

    /// Last mutation time
    pub updated_at: Time,
}

impl Default for PlanSnapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PlanSnapshot {
    /// Create a snapshot over a task pool with nothing selected.
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            version: 0,
            tasks,
            selected: Vec::new(),
            updated_at: chrono::Utc::now(),
        }
    }

    /// Add a task to the pool.
    pub fn add_task(&self, task: Task) -> Result<Self, SnapshotError> {
        if self.task(&task.id).is_some() {
            return Err(SnapshotError::DuplicateTask(task.id));
        }
        let mut next = self.next();
        next.tasks.push(task);
        Ok(next)
    }

    /// Append a task to the selection.
    pub fn select(&self, id: &TaskId) -> Result<Self, SnapshotError> {
        if self.task(id).is_none() {
            return Err(SnapshotError::UnknownTask(id.clone()));
        }
        if self.is_selected(id) {
            return Err(SnapshotError::AlreadySelected(id.clone()));
        }
        let mut next = self.next();
        next.selected.push(id.clone());
        Ok(next)
    }

    /// Remove a task from the selection.
    pub fn deselect(&self, id: &TaskId) -> Result<Self, SnapshotError> {
        let Some(pos) = self.position(id) else {
            return Err(SnapshotError::NotSelected(id.clone()));
        };
        let mut next = self.next();
        next.selected.remove(pos);
        Ok(next)
    }

    /// Move a selected task to `position`, clamped to the end of the selection.
    pub fn move_to(&self, id: &TaskId, position: usize) -> Result<Self, SnapshotError> {
        let Some(pos) = self.position(id) else {
            return Err(SnapshotError::NotSelected(id.clone()));
        };
        let mut next = self.next();
        let moved = next.selected.remove(pos);
        let target = position.min(next.selected.len());
        next.selected.insert(target, moved);
        Ok(next)
    }

    /// Drop the whole selection.
    pub fn clear_selection(&self) -> Self {
        let mut next = self.next();
        next.selected.clear();
        next
    }

    /// Look up a task in the pool.
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        find_task(&self.tasks, id)
    }

    /// Whether the task is selected.
    pub fn is_selected(&self, id: &TaskId) -> bool {
        self.selected.contains(id)
    }

    /// The first selected task.
    pub fn frog(&self) -> Option<&Task> {
        self.selected.first().and_then(|id| self.task(id))
    }

    /// Selected tasks in selection order; ids missing from the pool are skipped.
    pub fn selected_tasks(&self) -> Vec<&Task> {
        self.selected.iter().filter_map(|id| self.task(id)).collect()
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.selected.iter().position(|s| s == id)
    }

    fn next(&self) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next.updated_at = chrono::Utc::now();
        next
    }
}
