//! Scripted stand-ins for the model and web capabilities.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use taskscout_core::error::{ProviderError, WebError};
use taskscout_core::message::Message;
use taskscout_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
use taskscout_core::web::{PageFetcher, SearchEngine};

type CompleteFn = Box<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;
type EmbedFn = Box<dyn Fn(&str) -> Result<Vec<f32>, ProviderError> + Send + Sync>;

/// A provider whose replies are computed from the prompt.
///
/// Counts calls and records every prompt so tests can assert on both.
pub struct MockProvider {
    complete_fn: CompleteFn,
    embed_fn: Option<EmbedFn>,
    latency: Option<Duration>,
    completion_calls: AtomicUsize,
    embedding_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(
        complete_fn: impl Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            complete_fn: Box::new(complete_fn),
            embed_fn: None,
            latency: None,
            completion_calls: AtomicUsize::new(0),
            embedding_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always succeeds with the text produced by `f`.
    pub fn replying(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::new(move |prompt| Ok(f(prompt)))
    }

    pub fn with_embedder(
        mut self,
        f: impl Fn(&str) -> Result<Vec<f32>, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.embed_fn = Some(Box::new(f));
        self
    }

    /// Hold every call open for `latency` so concurrency can be observed.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }

    pub fn embedding_calls(&self) -> usize {
        self.embedding_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request
            .messages
            .first()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt.clone());

        self.enter().await;
        let result = (self.complete_fn)(&prompt);
        self.leave();

        result.map(|text| make_text_response(&text))
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.embedding_calls.fetch_add(1, Ordering::SeqCst);
        let Some(embed_fn) = &self.embed_fn else {
            return Err(ProviderError::NotConfigured("mock has no embedder".into()));
        };

        self.enter().await;
        let result: Result<Vec<Vec<f32>>, ProviderError> =
            request.inputs.iter().map(|text| embed_fn(text)).collect();
        self.leave();

        Ok(EmbeddingResponse {
            embeddings: result?,
            model: request.model,
            usage: None,
        })
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Pull the text between the `: ` after `marker` and the end of the prompt.
///
/// Summary prompts end with the text being summarized; tests use this to
/// echo a recognisable slice of it back.
pub fn prompt_tail<'a>(prompt: &'a str, marker: &str) -> &'a str {
    prompt
        .find(marker)
        .map(|i| &prompt[i + marker.len()..])
        .unwrap_or(prompt)
}

/// A search engine returning a fixed result list, or failing.
pub struct MockSearch {
    result: Result<Vec<String>, WebError>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl MockSearch {
    pub fn returning(urls: &[&str]) -> Self {
        Self {
            result: Ok(urls.iter().map(|u| u.to_string()).collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(WebError::Network("search unreachable".into())),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchEngine for MockSearch {
    fn name(&self) -> &str {
        "mock_search"
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<String>, WebError> {
        self.queries.lock().unwrap().push((query.to_string(), count));
        self.result
            .clone()
            .map(|urls| urls.into_iter().take(count).collect())
    }
}

/// A fetcher serving pages from a map; unknown URLs fail with a network error.
pub struct MockFetcher {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, text)| (url.to_string(), text.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, WebError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| WebError::Network(format!("{url}: connection refused")))
    }
}

/// Embeds text as keyword counts over a tiny fixed vocabulary.
///
/// Enough structure for ranking tests to have an unambiguous best match.
pub fn keyword_embedding(text: &str) -> Vec<f32> {
    const VOCAB: [&[&str]; 4] = [
        &["climate", "carbon", "emissions", "warming"],
        &["policy", "law", "regulation", "tax"],
        &["football", "match", "goal", "league"],
        &["recipe", "bake", "flour", "oven"],
    ];
    let lower = text.to_lowercase();
    VOCAB
        .iter()
        .map(|words| words.iter().filter(|w| lower.contains(**w)).count() as f32)
        .collect()
}
