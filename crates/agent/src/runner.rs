//! The objective runner: plan, research and execute each task in order.

use std::fmt;

use serde::Serialize;
use taskscout_core::error::Error;
use taskscout_core::task::{Task, TaskId, TaskStatus};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::context::ContextBuilder;
use crate::event::RunEvent;
use crate::llm::LanguageModel;
use crate::planner::Planner;

/// The result of one task, as reported at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub id: TaskId,
    pub description: String,
    pub response: String,
    pub status: TaskStatus,
}

/// Everything a run produced, in task order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub objective: String,
    pub outcomes: Vec<TaskOutcome>,
}

impl Report {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Failed)
            .count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The objective was to {}. Here are the results:", self.objective)?;
        writeln!(f, "{}", "=".repeat(64))?;
        for outcome in &self.outcomes {
            writeln!(f)?;
            writeln!(f, " {}", outcome.response)?;
        }
        Ok(())
    }
}

pub struct AgentRunner {
    llm: LanguageModel,
    planner: Planner,
    /// `None` when no search credentials are configured; tasks then run on
    /// the model's own knowledge.
    context: Option<ContextBuilder>,
    events: Option<UnboundedSender<RunEvent>>,
}

impl AgentRunner {
    pub fn new(llm: LanguageModel, context: Option<ContextBuilder>) -> Self {
        Self {
            planner: Planner::new(llm.clone()),
            llm,
            context,
            events: None,
        }
    }

    /// Send progress events to `tx` while running.
    pub fn with_events(mut self, tx: UnboundedSender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events
            && tx.send(event).is_err()
        {
            debug!("Event receiver dropped");
        }
    }

    /// Ask the model whether `task` needs fresh information from the web.
    ///
    /// A failed call is treated as "no".
    pub async fn needs_search(&self, task: &Task) -> bool {
        let prompt = format!(
            "Do I need to search the internet to accomplish the task: {}? Does it require \
             up-to-date information or data? reply by 'yes' or 'no'?",
            task.description
        );
        match self.llm.complete(&prompt, None).await {
            Ok(reply) => reply.to_lowercase().contains("yes"),
            Err(e) => {
                warn!(task = %task.description, error = %e, "Search decision failed, assuming no");
                false
            }
        }
    }

    /// A short web query for `task`, falling back to its description.
    pub async fn search_query(&self, task: &Task) -> String {
        let prompt = format!(
            "In four words, what search prompt will help for this task: {}?",
            task.description
        );
        match self.llm.complete(&prompt, None).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().trim_matches('"').to_lowercase(),
            Ok(_) => task.description.to_lowercase(),
            Err(e) => {
                warn!(task = %task.description, error = %e, "Search query failed, using description");
                task.description.to_lowercase()
            }
        }
    }

    /// Run the execution prompt for `task`, recording the answer on it.
    pub async fn execute(&self, task: &mut Task, objective: &str) -> Result<(), Error> {
        task.status = TaskStatus::Executing;
        let prompt = format!(
            "You are an AI agent and you should execute this task: {}, given this objective: \
             {objective} and this context: {}. Your response should have 300 characters maximum.",
            task.description,
            task.context.trim()
        );

        match self.llm.complete(&prompt, None).await {
            Ok(reply) => {
                task.response = Some(reply);
                task.status = TaskStatus::Completed;
                Ok(())
            }
            Err(e) => {
                task.response = Some(e.to_string());
                task.status = TaskStatus::Failed;
                Err(e.into())
            }
        }
    }

    /// Decide on research for task `index` and attach any web context found.
    async fn research(&self, index: usize, task: &mut Task) {
        let Some(context) = &self.context else {
            return;
        };

        if !self.needs_search(task).await {
            self.emit(RunEvent::SearchDecided {
                index,
                needed: false,
                query: None,
            });
            return;
        }

        let query = self.search_query(task).await;
        info!(task = %task.description, query = %query, "Searching the web");
        self.emit(RunEvent::SearchDecided {
            index,
            needed: true,
            query: Some(query.clone()),
        });

        match context.enrich(task, &query).await {
            Ok(chars) => self.emit(RunEvent::ContextAttached { index, chars }),
            Err(e) => self.emit(RunEvent::ContextFailed {
                index,
                reason: e.to_string(),
            }),
        }
    }

    /// Plan `objective` and work through every task in order.
    ///
    /// Only a failed plan aborts the run; task failures are recorded in the
    /// report and the next task still runs.
    pub async fn run(&self, objective: &str) -> Result<Report, Error> {
        let objective = objective.trim();
        let mut tasks = self.planner.plan(objective).await?;
        self.emit(RunEvent::Planned {
            tasks: tasks.iter().map(|t| t.description.clone()).collect(),
        });

        let mut outcomes = Vec::with_capacity(tasks.len());
        let mut previous: Option<(String, String)> = None;

        for (index, task) in tasks.iter_mut().enumerate() {
            if let Some((description, result)) = &previous {
                task.add_context(&format!(
                    "Previous task description: {description}, Previous task result: {result}"
                ));
            }

            info!(index, task_id = %task.id, task = %task.description, "Executing task");
            self.emit(RunEvent::TaskStarted {
                index,
                description: task.description.clone(),
            });

            self.research(index, task).await;

            match self.execute(task, objective).await {
                Ok(()) => self.emit(RunEvent::TaskCompleted {
                    index,
                    result: task.response.clone().unwrap_or_default(),
                }),
                Err(e) => {
                    warn!(index, task_id = %task.id, error = %e, "Task failed");
                    self.emit(RunEvent::TaskFailed {
                        index,
                        error: e.to_string(),
                    });
                }
            }

            let response = task.response.clone().unwrap_or_default();
            previous = Some((task.description.clone(), response.clone()));
            outcomes.push(TaskOutcome {
                id: task.id.clone(),
                description: task.description.clone(),
                response,
                status: task.status,
            });
        }

        Ok(Report {
            objective: objective.to_string(),
            outcomes,
        })
    }
}
