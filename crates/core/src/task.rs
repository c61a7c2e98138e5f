//! Task model - the unit of work a day is planned from.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use crate::id::TaskId;
use crate::Time;

/// Default estimate for a task captured without one, in minutes.
pub const DEFAULT_ESTIMATED_DURATION: u32 = 30;

/// A captured task, candidate for today's selection.
///
/// Tasks are immutable by convention: the engine only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the task is due
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Time>,

    /// How much the outcome matters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Level>,

    /// How demanding the work is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<Level>,

    /// Kind of attention the task needs
    pub context: WorkContext,

    /// Tasks that must be selected before this one can be completed
    #[serde(default)]
    pub dependencies: BTreeSet<TaskId>,

    /// Estimated duration in minutes
    #[serde(default = "default_estimated_duration")]
    pub estimated_duration: u32,

    /// Free-text tags
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

fn default_estimated_duration() -> u32 {
    DEFAULT_ESTIMATED_DURATION
}

impl Task {
    /// Create a new task with a generated id.
    pub fn new(title: impl Into<String>, context: WorkContext) -> Self {
        Self::with_id(TaskId::new(), title, context)
    }

    /// Create a new task with a caller-chosen id.
    pub fn with_id(id: impl Into<TaskId>, title: impl Into<String>, context: WorkContext) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            importance: None,
            effort: None,
            context,
            dependencies: BTreeSet::new(),
            estimated_duration: DEFAULT_ESTIMATED_DURATION,
            tags: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the due date.
    pub fn with_due_date(mut self, due: Time) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Set the importance.
    pub fn with_importance(mut self, importance: Level) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Set the effort.
    pub fn with_effort(mut self, effort: Level) -> Self {
        self.effort = Some(effort);
        self
    }

    /// Set the estimated duration in minutes.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = minutes;
        self
    }

    /// Declare a prerequisite.
    pub fn depends_on(mut self, id: impl Into<TaskId>) -> Self {
        self.dependencies.insert(id.into());
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Whether the task needs sustained focus.
    pub fn is_deep(&self) -> bool {
        self.context == WorkContext::Deep
    }

    /// Whether the task lists its own id as a dependency.
    pub fn depends_on_itself(&self) -> bool {
        self.dependencies.contains(&self.id)
    }
}

/// Three-step scale used for importance and effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

impl Level {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// Work-type context of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkContext {
    /// Sustained, focused work
    #[serde(rename = "@deep")]
    Deep,
    /// Routine, interruptible work
    #[serde(rename = "@shallow")]
    Shallow,
}

impl WorkContext {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkContext::Deep => "@deep",
            WorkContext::Shallow => "@shallow",
        }
    }
}

impl std::fmt::Display for WorkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('@').to_lowercase().as_str() {
            "deep" => Ok(WorkContext::Deep),
            "shallow" => Ok(WorkContext::Shallow),
            other => Err(format!("unknown context: {other}")),
        }
    }
}

/// Look up a task by id in a pool.
pub fn find_task<'a>(tasks: &'a [Task], id: &TaskId) -> Option<&'a Task> {
    tasks.iter().find(|t| &t.id == id)
}
