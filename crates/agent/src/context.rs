//! Web context for a task: search, scrape, compress.
//!
//! `ContextBuilder` turns a search query into a short block of text the
//! execution prompt can carry. Search results are fetched concurrently,
//! each page is clipped, and the merged text is either ranked against the
//! task or run through the batch summarizer.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use taskscout_config::{AppConfig, ContextMode};
use taskscout_core::error::PipelineError;
use taskscout_core::task::Task;
use taskscout_core::web::{NOT_HTML_PLACEHOLDER, PageFetcher, SearchEngine};
use tracing::{debug, info, warn};

use crate::llm::LanguageModel;
use crate::ranker::{RankerConfig, SemanticRanker};
use crate::summarizer::{BatchSummarizer, SummarizerConfig};
use crate::text::{join_non_empty, truncate_chars};

#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// URLs requested from the search engine
    pub search_results: usize,
    /// Characters kept from each page
    pub page_char_limit: usize,
    pub fetch_concurrency: usize,
    pub mode: ContextMode,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ContextConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            search_results: config.search.results,
            page_char_limit: config.pipeline.page_char_limit,
            fetch_concurrency: config.search.results,
            mode: config.pipeline.context_mode,
        }
    }
}

pub struct ContextBuilder {
    search: Arc<dyn SearchEngine>,
    fetcher: Arc<dyn PageFetcher>,
    summarizer: BatchSummarizer,
    ranker: SemanticRanker,
    config: ContextConfig,
}

impl ContextBuilder {
    pub fn new(
        search: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn PageFetcher>,
        summarizer: BatchSummarizer,
        ranker: SemanticRanker,
        config: ContextConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            summarizer,
            ranker,
            config,
        }
    }

    /// Wire a builder whose summarizer and ranker share `llm`.
    pub fn from_config(
        search: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn PageFetcher>,
        llm: LanguageModel,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            search,
            fetcher,
            BatchSummarizer::new(llm.clone(), SummarizerConfig::from(&config.pipeline)),
            SemanticRanker::new(llm, RankerConfig::from(&config.pipeline)),
            ContextConfig::from(config),
        )
    }

    /// Search for `query` and merge the clipped text of every result page.
    ///
    /// A page that fails to load counts as empty. Returns `EmptyInput` when
    /// the search fails, finds nothing, or no page yields any text.
    pub async fn gather(&self, query: &str) -> Result<String, PipelineError> {
        let urls = self
            .search
            .search(query, self.config.search_results)
            .await
            .map_err(|e| PipelineError::EmptyInput(format!("search via {} failed: {e}", self.search.name())))?;

        if urls.is_empty() {
            return Err(PipelineError::EmptyInput(format!("no search results for '{query}'")));
        }
        debug!(query, urls = urls.len(), "Fetching search results");

        let limit = self.config.page_char_limit;
        let pages: Vec<String> = stream::iter(urls.iter())
            .map(|url| async move {
                match self.fetcher.fetch(url).await {
                    Ok(text) if text == NOT_HTML_PLACEHOLDER => String::new(),
                    Ok(text) => truncate_chars(&text, limit).to_string(),
                    Err(e) => {
                        warn!(url = %url, error = %e, "Page fetch failed");
                        String::new()
                    }
                }
            })
            .buffered(self.config.fetch_concurrency.max(1))
            .collect()
            .await;

        let merged = join_non_empty(&pages);
        if merged.is_empty() {
            return Err(PipelineError::EmptyInput(format!(
                "none of {} pages had readable text",
                urls.len()
            )));
        }
        Ok(merged)
    }

    /// Gather pages for `search_query` and compress them for the task.
    pub async fn build(&self, task_description: &str, search_query: &str) -> Result<String, PipelineError> {
        let merged = self.gather(search_query).await?;

        let context = match self.config.mode {
            ContextMode::Rank => {
                let query = format!("{task_description} {search_query}");
                let top_k = self.ranker.config().top_k;
                self.ranker.rank(&query, &merged, top_k).await.join(" ")
            }
            ContextMode::Summarize => self.summarizer.summarize(&merged).await?,
        };

        debug!(mode = ?self.config.mode, chars = context.chars().count(), "Context built");
        Ok(context)
    }

    /// Append web context to `task`, returning how many chars were added.
    ///
    /// Failures are logged and leave the task untouched.
    pub async fn enrich(&self, task: &mut Task, search_query: &str) -> Result<usize, PipelineError> {
        match self.build(&task.description, search_query).await {
            Ok(context) if !context.is_empty() => {
                let chars = context.chars().count();
                task.add_context(&context);
                info!(task = %task.description, chars, "Added web context");
                Ok(chars)
            }
            Ok(_) => Ok(0),
            Err(e) => {
                warn!(task = %task.description, error = %e, "Proceeding without web context");
                Err(e)
            }
        }
    }
}
