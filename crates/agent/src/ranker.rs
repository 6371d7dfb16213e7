//! Semantic sentence ranking.
//!
//! Splits a document into sentences, embeds the query and every sentence
//! concurrently, and keeps the sentences closest to the query by cosine
//! similarity.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use taskscout_config::PipelineConfig;
use taskscout_core::error::ProviderError;
use tracing::{debug, warn};

use crate::llm::LanguageModel;

#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub top_k: usize,
    pub embed_concurrency: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for RankerConfig {
    fn from(p: &PipelineConfig) -> Self {
        Self {
            top_k: p.top_k,
            embed_concurrency: p.embed_concurrency,
        }
    }
}

/// A sentence with its similarity to the query and its position in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSentence {
    pub sentence: String,
    pub score: f32,
    pub index: usize,
}

/// Cosine of the angle between `a` and `b`.
///
/// Empty, mismatched or zero-magnitude inputs score 0.0; the result is never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |acc, (&x, &y)| {
        let (x, y) = (f64::from(x), f64::from(y));
        (acc.0 + x * y, acc.1 + x * x, acc.2 + y * y)
    });

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude < 1e-10 {
        return 0.0;
    }

    let similarity = (dot / magnitude) as f32;
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Split on `.`, `!` and `?`, keeping the terminator with its sentence.
///
/// A trailing fragment without a terminator is kept as its own sentence.
pub fn split_sentences(document: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (idx, c) in document.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let end = idx + c.len_utf8();
            push_trimmed(&mut sentences, &document[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &document[start..]);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, fragment: &str) {
    let fragment = fragment.trim();
    // A lone terminator ("...", "?!") carries no content
    if fragment.chars().any(|c| !matches!(c, '.' | '!' | '?')) {
        sentences.push(fragment.to_string());
    }
}

pub struct SemanticRanker {
    llm: LanguageModel,
    config: RankerConfig,
}

impl SemanticRanker {
    pub fn new(llm: LanguageModel, config: RankerConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// The `top_k` sentences of `document` most similar to `query`, best first.
    pub async fn rank(&self, query: &str, document: &str, top_k: usize) -> Vec<String> {
        self.rank_scored(query, document, top_k)
            .await
            .into_iter()
            .map(|r| r.sentence)
            .collect()
    }

    /// Like [`Self::rank`], keeping scores and document positions.
    ///
    /// Sentences whose embedding failed score `-inf` and sink to the bottom.
    /// If the query itself cannot be embedded the first `top_k` sentences
    /// are returned in document order.
    pub async fn rank_scored(&self, query: &str, document: &str, top_k: usize) -> Vec<RankedSentence> {
        let sentences = split_sentences(document);
        if sentences.is_empty() || top_k == 0 {
            return Vec::new();
        }

        // The query rides in the same bounded gather as the sentences, first
        let texts = std::iter::once(query).chain(sentences.iter().map(String::as_str));
        let embeddings: Vec<Result<Vec<f32>, ProviderError>> = stream::iter(texts)
            .map(|text| self.llm.embed(text))
            .buffered(self.config.embed_concurrency.max(1))
            .collect()
            .await;

        let mut embeddings = embeddings.into_iter();
        let query_vector = match embeddings.next() {
            Some(Ok(v)) => v,
            failed => {
                if let Some(Err(e)) = failed {
                    warn!(error = %e, "Query embedding failed, keeping document order");
                }
                return sentences
                    .into_iter()
                    .take(top_k)
                    .enumerate()
                    .map(|(index, sentence)| RankedSentence {
                        sentence,
                        score: f32::NEG_INFINITY,
                        index,
                    })
                    .collect();
            }
        };

        let scores: Vec<f32> = embeddings
            .enumerate()
            .map(|(index, embedding)| match embedding {
                Ok(v) => cosine_similarity(&query_vector, &v),
                Err(e) => {
                    warn!(index, error = %e, "Sentence embedding failed");
                    f32::NEG_INFINITY
                }
            })
            .collect();

        let mut ranked: Vec<RankedSentence> = sentences
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(index, (sentence, score))| RankedSentence { sentence, score, index })
            .collect();

        // Stable: equal scores keep document order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_k);

        debug!(
            kept = ranked.len(),
            best = ranked.first().map(|r| r.score),
            "Ranked sentences"
        );
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockProvider, keyword_embedding};
    use std::sync::Arc;
    use std::time::Duration;

    fn keyword_provider() -> Arc<MockProvider> {
        Arc::new(MockProvider::replying(|_| String::new()).with_embedder(|t| Ok(keyword_embedding(t))))
    }

    fn ranker(provider: Arc<MockProvider>) -> SemanticRanker {
        SemanticRanker::new(LanguageModel::new(provider, "m"), RankerConfig::default())
    }

    #[test]
    fn cosine_identical_and_orthogonal() {
        let v = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_is_scale_invariant() {
        let a = [0.3, -1.2, 4.0, 0.0];
        let b = [2.0, 0.5, 1.0, -3.0];
        let base = cosine_similarity(&a, &b);
        for k in [0.001f32, 2.0, 1000.0] {
            let scaled: Vec<f32> = a.iter().map(|x| x * k).collect();
            assert!((cosine_similarity(&scaled, &b) - base).abs() < 1e-5);
        }
    }

    #[test]
    fn cosine_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn sentences_keep_terminators() {
        let sentences = split_sentences("First one. Second one!  Third?   trailing bit");
        assert_eq!(
            sentences,
            vec!["First one.", "Second one!", "Third?", "trailing bit"]
        );
    }

    #[test]
    fn sentences_drop_empty_fragments() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("  ...  ").is_empty());
        assert_eq!(split_sentences("Wait... what?"), vec!["Wait.", "what?"]);
    }

    #[tokio::test]
    async fn climate_policy_sentence_ranks_first() {
        let provider = keyword_provider();
        let document = "The football match ended with a late goal. \
                        A carbon tax is the most direct climate policy to cut emissions. \
                        Bake the bread in a hot oven.";

        let top = ranker(provider).rank("climate policy", document, 1).await;
        assert_eq!(
            top,
            vec!["A carbon tax is the most direct climate policy to cut emissions."]
        );
    }

    #[tokio::test]
    async fn top_k_bounds_result() {
        let provider = keyword_provider();
        let document = "One climate fact. Two. Three. Four. Five.";
        let ranker = ranker(provider.clone());

        let top = ranker.rank("climate", document, 3).await;
        assert_eq!(top.len(), 3);
        assert_eq!(top[0], "One climate fact.");
        let all = split_sentences(document);
        assert!(top.iter().all(|s| all.contains(s)));

        // Fewer sentences than top_k
        assert_eq!(ranker.rank("climate", "Only one.", 3).await.len(), 1);
    }

    #[tokio::test]
    async fn ties_keep_document_order() {
        let provider = keyword_provider();
        let ranked = ranker(provider)
            .rank_scored("football", "Alpha. Beta. Gamma.", 3)
            .await;
        assert_eq!(
            ranked.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn empty_document_makes_no_calls() {
        let provider = keyword_provider();
        assert!(ranker(provider.clone()).rank("climate", "   ", 3).await.is_empty());
        assert_eq!(provider.embedding_calls(), 0);
    }

    #[tokio::test]
    async fn failed_sentence_embedding_sinks() {
        let provider = Arc::new(MockProvider::replying(|_| String::new()).with_embedder(|t| {
            if t.contains("broken") {
                Err(ProviderError::Network("reset".into()))
            } else {
                Ok(keyword_embedding(t))
            }
        }));
        let document = "A broken climate line. Football goal. Climate warming facts.";

        let ranked = ranker(provider).rank_scored("climate", document, 3).await;
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].sentence, "Climate warming facts.");
        assert_eq!(ranked[2].sentence, "A broken climate line.");
        assert_eq!(ranked[2].score, f32::NEG_INFINITY);
    }

    #[tokio::test]
    async fn query_embedding_failure_falls_back_to_document_order() {
        let provider = Arc::new(MockProvider::replying(|_| String::new()).with_embedder(|t| {
            if t == "climate policy" {
                Err(ProviderError::Timeout("slow".into()))
            } else {
                Ok(keyword_embedding(t))
            }
        }));
        let document = "First. Second climate policy. Third. Fourth.";

        let top = ranker(provider.clone()).rank("climate policy", document, 2).await;
        assert_eq!(top, vec!["First.", "Second climate policy."]);
        // Query and sentences were requested together
        assert_eq!(provider.embedding_calls(), 5);
    }

    #[tokio::test]
    async fn embedding_concurrency_is_bounded() {
        let provider = Arc::new(
            MockProvider::replying(|_| String::new())
                .with_embedder(|t| Ok(keyword_embedding(t)))
                .with_latency(Duration::from_millis(20)),
        );
        let config = RankerConfig {
            top_k: 3,
            embed_concurrency: 3,
        };
        let ranker = SemanticRanker::new(LanguageModel::new(provider.clone(), "m"), config);
        let document = (0..12).map(|i| format!("Climate note {i}.")).collect::<Vec<_>>().join(" ");

        let top = ranker.rank("climate", &document, 3).await;

        assert_eq!(top.len(), 3);
        assert_eq!(provider.embedding_calls(), 13);
        assert!(provider.peak_in_flight() <= 3);
        assert!(provider.peak_in_flight() >= 2);
    }
}
