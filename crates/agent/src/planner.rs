//! Objective decomposition.

use regex_lite::Regex;
use std::sync::LazyLock;
use taskscout_core::error::{Error, PipelineError};
use taskscout_core::task::Task;
use tracing::{debug, info};

use crate::llm::LanguageModel;

fn plan_prompt(objective: &str) -> String {
    format!(
        "You are an AI agent, please break down the following objective into a list of tasks: \
         {objective}. Tasks should be separated by a newline. Tasks should be in order of priority."
    )
}

/// A numbered-list marker ("1." or "2)") at a line start or after whitespace.
static LIST_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)(\d+)[.)]").ok());

/// Byte span of one list marker.
struct Marker {
    start: usize,
    end: usize,
    number: u64,
    at_line_start: bool,
}

fn find_markers(reply: &str, pattern: &Regex) -> Vec<Marker> {
    pattern
        .captures_iter(reply)
        .filter_map(|caps| {
            let (whole, digits) = (caps.get(0)?, caps.get(1)?);
            // "3.5" is a number, not a marker
            if reply[whole.end()..].starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }
            let line = reply[..digits.start()].rsplit('\n').next().unwrap_or_default();
            Some(Marker {
                start: digits.start(),
                end: whole.end(),
                number: digits.as_str().parse().ok()?,
                at_line_start: line.trim().is_empty(),
            })
        })
        .collect()
}

/// Keep markers that count up by one from the first.
fn in_sequence(markers: Vec<Marker>) -> Vec<Marker> {
    let mut kept: Vec<Marker> = Vec::new();
    for marker in markers {
        if kept.last().is_none_or(|prev| marker.number == prev.number + 1) {
            kept.push(marker);
        }
    }
    kept
}

/// Turn the model's list into task descriptions.
///
/// A list with two or more numbered lines is split at line-start markers
/// only, so numbers inside a task stay put and items may wrap. Otherwise
/// markers after whitespace count too, which splits a one-line list.
/// Markers must count up by one. Any preamble before the first marker is
/// dropped. Without numbering every non-empty line is a task, with leading
/// bullets stripped.
pub fn parse_tasks(reply: &str) -> Vec<String> {
    let markers = LIST_MARKER
        .as_ref()
        .map(|pattern| find_markers(reply, pattern))
        .unwrap_or_default();

    let line_markers = markers.iter().filter(|m| m.at_line_start).count();
    let markers = if line_markers >= 2 {
        in_sequence(markers.into_iter().filter(|m| m.at_line_start).collect())
    } else {
        in_sequence(markers)
    };

    if !markers.is_empty() {
        return markers
            .iter()
            .enumerate()
            .map(|(i, marker)| {
                let end = markers.get(i + 1).map_or(reply.len(), |next| next.start);
                reply[marker.end..end].split_whitespace().collect::<Vec<_>>().join(" ")
            })
            .filter(|item| !item.is_empty())
            .collect();
    }

    reply
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct Planner {
    llm: LanguageModel,
}

impl Planner {
    pub fn new(llm: LanguageModel) -> Self {
        Self { llm }
    }

    /// Ask the model to break `objective` into ordered tasks.
    pub async fn plan(&self, objective: &str) -> Result<Vec<Task>, Error> {
        let objective = objective.trim();
        if objective.is_empty() {
            return Err(PipelineError::EmptyInput("objective is empty".into()).into());
        }

        let reply = self.llm.complete(&plan_prompt(objective), None).await?;
        debug!(reply = %reply, "Planner reply");

        let tasks: Vec<Task> = parse_tasks(&reply).into_iter().map(Task::new).collect();
        if tasks.is_empty() {
            return Err(PipelineError::EmptyInput("planner returned no tasks".into()).into());
        }

        info!(count = tasks.len(), "Objective planned");
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockProvider;
    use std::sync::Arc;
    use taskscout_core::error::ProviderError;

    fn planner(reply: &'static str) -> (Planner, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider::replying(move |_| reply.to_string()));
        (Planner::new(LanguageModel::new(provider.clone(), "m")), provider)
    }

    #[test]
    fn parses_numbered_list() {
        let reply = "1. Research the market\n2. Draft a plan\n3. Review it";
        assert_eq!(
            parse_tasks(reply),
            vec!["Research the market", "Draft a plan", "Review it"]
        );
    }

    #[test]
    fn numbered_items_may_wrap_lines() {
        let reply = "Here is the plan:\n1. Find data\n   on emissions\n2) Summarize";
        assert_eq!(
            parse_tasks(reply),
            vec!["Find data on emissions", "Summarize"]
        );
    }

    #[test]
    fn numbers_inside_a_task_are_kept() {
        let reply = "1. Compare the 2. and 3. editions\n2. Pick one";
        assert_eq!(
            parse_tasks(reply),
            vec!["Compare the 2. and 3. editions", "Pick one"]
        );
    }

    #[test]
    fn markers_without_a_space_are_stripped() {
        let reply = "1.Research the market\n2.Draft a plan\n3.Review it";
        assert_eq!(
            parse_tasks(reply),
            vec!["Research the market", "Draft a plan", "Review it"]
        );
    }

    #[test]
    fn one_line_list_is_split() {
        let reply = "1. Research the market 2. Draft a plan 3. Review it";
        assert_eq!(
            parse_tasks(reply),
            vec!["Research the market", "Draft a plan", "Review it"]
        );
    }

    #[test]
    fn one_line_list_keeps_decimals_and_out_of_order_numbers() {
        let reply = "Plan: 1. Check version 3.5 of the API 2. Read 7. chapter notes";
        assert_eq!(
            parse_tasks(reply),
            vec!["Check version 3.5 of the API", "Read 7. chapter notes"]
        );
    }

    #[test]
    fn falls_back_to_lines_and_bullets() {
        let reply = "- Gather sources\n\n* Write summary\nPublish";
        assert_eq!(
            parse_tasks(reply),
            vec!["Gather sources", "Write summary", "Publish"]
        );
    }

    #[tokio::test]
    async fn plan_sends_objective_in_prompt() {
        let (planner, provider) = planner("1. First\n2. Second");
        let tasks = planner.plan("  Learn Rust  ").await.unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].description, "First");
        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("list of tasks: Learn Rust."));
        assert!(prompt.ends_with("Tasks should be in order of priority."));
    }

    #[tokio::test]
    async fn empty_objective_makes_no_call() {
        let (planner, provider) = planner("1. unused");
        let err = planner.plan("   ").await.unwrap_err();
        assert!(matches!(err, Error::Pipeline(PipelineError::EmptyInput(_))));
        assert_eq!(provider.completion_calls(), 0);
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let (planner, _) = planner("  \n ");
        assert!(planner.plan("Something").await.is_err());
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(MockProvider::new(|_| {
            Err(ProviderError::AuthenticationFailed("bad key".into()))
        }));
        let planner = Planner::new(LanguageModel::new(provider, "m"));
        let err = planner.plan("Something").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::AuthenticationFailed(_))));
    }
}
