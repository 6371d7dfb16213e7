//! Progress events emitted while an objective runs.
//!
//! The CLI renders these as they arrive; anything else can serialize them.

use serde::{Deserialize, Serialize};

/// Events emitted by [`crate::AgentRunner`] during a run.
///
/// - `planned`          : the objective was broken into tasks
/// - `task_started`     : a task began
/// - `search_decided`   : the model decided whether the task needs the web
/// - `context_attached` : web context was added to the task
/// - `context_failed`   : web context could not be built; the task continues
/// - `task_completed`   : the task produced a result
/// - `task_failed`      : the task's execution call failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Planned { tasks: Vec<String> },

    TaskStarted { index: usize, description: String },

    SearchDecided {
        index: usize,
        needed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<String>,
    },

    ContextAttached { index: usize, chars: usize },

    ContextFailed { index: usize, reason: String },

    TaskCompleted { index: usize, result: String },

    TaskFailed { index: usize, error: String },
}

impl RunEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Planned { .. } => "planned",
            Self::TaskStarted { .. } => "task_started",
            Self::SearchDecided { .. } => "search_decided",
            Self::ContextAttached { .. } => "context_attached",
            Self::ContextFailed { .. } => "context_failed",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
        }
    }
}
