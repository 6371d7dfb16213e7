//! Task: one subtask of the user's objective.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Executing,
    Completed,
    Failed,
}

/// A subtask produced by decomposing an objective.
///
/// Context only ever grows: web findings and the previous task's result are
/// appended, never substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    /// What the task asks for, as produced by the planner.
    pub description: String,

    pub status: TaskStatus,

    /// Accumulated context injected into the execution prompt.
    #[serde(default)]
    pub context: String,

    /// The model's answer once executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            description: description.into().trim().to_string(),
            status: TaskStatus::Pending,
            context: String::new(),
            response: None,
        }
    }

    /// Append text to the task's context, separated by a single space.
    pub fn add_context(&mut self, text: &str) {
        self.context.push(' ');
        self.context.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_pending_and_trimmed() {
        let task = Task::new("  Find the latest Rust release \n");
        assert_eq!(task.description, "Find the latest Rust release");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.context.is_empty());
        assert!(task.response.is_none());
    }

    #[test]
    fn add_context_appends() {
        let mut task = Task::new("t");
        task.add_context("first");
        task.add_context("second");
        assert_eq!(task.context, " first second");
    }

    #[test]
    fn tasks_get_unique_ids() {
        assert_ne!(Task::new("same").id, Task::new("same").id);
    }
}
