//! Batch summarization of long documents.
//!
//! A document is cut into fixed-size character batches, every batch is
//! summarized concurrently, and the joined summaries are compressed once
//! more. When the joined summaries are themselves too long for a single
//! final call they are split into a few parts and each part is summarized
//! on its own instead.
//!
//! Workers never share an accumulator: each returns its own summary and the
//! results are gathered back by batch position.

use futures::stream::{self, StreamExt};
use taskscout_config::PipelineConfig;
use taskscout_core::error::PipelineError;
use tracing::{debug, warn};

use crate::llm::LanguageModel;
use crate::text::{join_non_empty, split_chars, split_even, truncate_chars};

/// One retry per batch before it is given up.
const MAX_ATTEMPTS: usize = 2;

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub batch_size: usize,
    pub unit_summary_chars: usize,
    pub final_summary_chars: usize,
    pub max_concurrency: usize,
    pub compression_threshold: usize,
    pub compression_parts: usize,
    pub part_summary_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for SummarizerConfig {
    fn from(p: &PipelineConfig) -> Self {
        Self {
            batch_size: p.batch_size,
            unit_summary_chars: p.unit_summary_chars,
            final_summary_chars: p.final_summary_chars,
            max_concurrency: p.max_concurrency,
            compression_threshold: p.compression_threshold,
            compression_parts: p.compression_parts,
            part_summary_chars: p.part_summary_chars,
        }
    }
}

/// Partition `document` into ordered batches of at most `batch_size` chars.
pub fn split_batches(document: &str, batch_size: usize) -> Vec<&str> {
    split_chars(document, batch_size.max(1))
}

fn summary_prompt(text: &str, chars: usize) -> String {
    format!("Please summarize the following content in {chars} characters: {text}")
}

pub struct BatchSummarizer {
    llm: LanguageModel,
    config: SummarizerConfig,
}

impl BatchSummarizer {
    pub fn new(llm: LanguageModel, config: SummarizerConfig) -> Self {
        Self { llm, config }
    }

    /// Summarize `document` with the configured budgets.
    pub async fn summarize(&self, document: &str) -> Result<String, PipelineError> {
        self.summarize_with(
            document,
            self.config.batch_size,
            self.config.unit_summary_chars,
            self.config.final_summary_chars,
            self.config.max_concurrency,
        )
        .await
    }

    /// Summarize `document` with explicit budgets.
    ///
    /// Returns an empty string, without calling the model, for an empty
    /// document. Batches that fail twice contribute nothing; only a failed
    /// final compression is reported as an error.
    pub async fn summarize_with(
        &self,
        document: &str,
        batch_size: usize,
        unit_summary_chars: usize,
        final_summary_chars: usize,
        max_concurrency: usize,
    ) -> Result<String, PipelineError> {
        let batches = split_batches(document, batch_size);
        if batches.is_empty() {
            return Ok(String::new());
        }

        debug!(
            batches = batches.len(),
            batch_size, max_concurrency, "Summarizing document in batches"
        );

        let summaries = self
            .summarize_all(&batches, unit_summary_chars, max_concurrency)
            .await;
        let intermediate = join_non_empty(&summaries);

        if intermediate.is_empty() {
            warn!(batches = batches.len(), "Every batch summary failed");
            return Ok(String::new());
        }

        let bound = self.llm.char_bound(final_summary_chars);
        let intermediate_chars = intermediate.chars().count();

        if intermediate_chars > self.config.compression_threshold {
            debug!(
                chars = intermediate_chars,
                parts = self.config.compression_parts,
                "Intermediate summary too long, compressing in parts"
            );
            let parts = split_even(&intermediate, self.config.compression_parts.max(1));
            let part_chars = part_budget(
                self.config.part_summary_chars,
                final_summary_chars,
                parts.len(),
            );
            let compressed = join_non_empty(
                &self.summarize_all(&parts, part_chars, max_concurrency).await,
            );

            // No part survived: the intermediate text is still a usable digest.
            let compressed = if compressed.is_empty() {
                warn!("Every part summary failed, truncating intermediate summary");
                intermediate.as_str()
            } else {
                compressed.as_str()
            };
            return Ok(truncate_chars(compressed, bound).trim_end().to_string());
        }

        let prompt = summary_prompt(&intermediate, final_summary_chars);
        let summary = self
            .llm
            .complete(&prompt, Some(final_summary_chars))
            .await?;
        Ok(summary)
    }

    /// Summarize every piece concurrently, results in input order.
    async fn summarize_all(&self, pieces: &[&str], chars: usize, max_concurrency: usize) -> Vec<String> {
        stream::iter(pieces.iter().enumerate())
            .map(|(index, piece)| self.summarize_piece(index, piece, chars))
            .buffered(max_concurrency.max(1))
            .collect()
            .await
    }

    async fn summarize_piece(&self, index: usize, piece: &str, chars: usize) -> String {
        let prompt = summary_prompt(piece, chars);
        for attempt in 1..=MAX_ATTEMPTS {
            match self.llm.complete(&prompt, Some(chars)).await {
                Ok(summary) => return summary,
                Err(e) => warn!(index, attempt, error = %e, "Batch summary failed"),
            }
        }
        String::new()
    }
}

/// Per-part budget so that all parts plus separators fit the final target.
fn part_budget(part_summary_chars: usize, final_summary_chars: usize, parts: usize) -> usize {
    let parts = parts.max(1);
    let fair_share = final_summary_chars.saturating_sub(parts - 1) / parts;
    part_summary_chars.min(fair_share).max(1)
}
