//! The TaskScout agent: plan, research, execute.
//!
//! The agent follows a **Plan → Research → Execute** cycle:
//!
//! 1. **Plan**: decompose the objective into ordered tasks (one LLM call)
//! 2. **Think**: ask the LLM whether a task needs fresh web information
//! 3. **Research**: search, fetch pages, and compress them into context,
//!    either by semantic ranking of sentences or by batch summarization
//! 4. **Execute**: answer the task with the accumulated context, carrying the
//!    previous task's result forward
//!
//! The research stage is the only one with real structure: see
//! [`summarizer`], [`ranker`] and [`context`].

pub mod context;
pub mod event;
pub mod llm;
pub mod planner;
pub mod ranker;
pub mod runner;
pub mod summarizer;
pub mod text;

pub use context::{ContextBuilder, ContextConfig};
pub use event::RunEvent;
pub use llm::LanguageModel;
pub use planner::{Planner, parse_tasks};
pub use ranker::{RankedSentence, RankerConfig, SemanticRanker, cosine_similarity};
pub use runner::{AgentRunner, Report, TaskOutcome};
pub use summarizer::{BatchSummarizer, SummarizerConfig};

#[cfg(test)]
pub(crate) mod test_helpers;
