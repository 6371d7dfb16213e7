//! Language-model facade used by every agent stage.
//!
//! Wraps a [`Provider`] with the model names and sampling settings so the
//! pipeline only deals in `prompt -> String` and `text -> Vec<f32>`.

use std::sync::Arc;
use taskscout_config::AppConfig;
use taskscout_core::error::ProviderError;
use taskscout_core::provider::{EmbeddingRequest, Provider, ProviderRequest};
use tracing::debug;

use crate::text::truncate_chars;

#[derive(Clone)]
pub struct LanguageModel {
    provider: Arc<dyn Provider>,
    model: String,
    embedding_model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    overshoot_slack: f32,
}

impl LanguageModel {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            embedding_model: "text-embedding-3-small".into(),
            temperature: 0.2,
            max_tokens: Some(400),
            overshoot_slack: 0.2,
        }
    }

    /// Build from the application config, keeping the provider supplied by the router.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.default_model.clone())
            .with_embedding_model(config.embedding_model.clone())
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_overshoot_slack(config.pipeline.overshoot_slack)
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Fraction a bounded reply may exceed its requested length before it is cut.
    pub fn with_overshoot_slack(mut self, slack: f32) -> Self {
        self.overshoot_slack = slack.max(0.0);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Hard upper bound applied to a reply asked to fit in `max_chars`.
    pub fn char_bound(&self, max_chars: usize) -> usize {
        // f32 -> f64 widening of e.g. 0.2 must not add a char
        let slack = (max_chars as f64 * f64::from(self.overshoot_slack) - 1e-6).ceil();
        max_chars + slack.max(0.0) as usize
    }

    /// Send `prompt` and return the trimmed reply.
    ///
    /// With `max_output_chars` the reply is cut to [`Self::char_bound`]; the
    /// prompt itself is expected to state the bound.
    pub async fn complete(
        &self,
        prompt: &str,
        max_output_chars: Option<usize>,
    ) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::prompt(&self.model, prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = self.provider.complete(request).await?;
        let reply = response.message.content.trim();

        let reply = match max_output_chars {
            Some(n) => truncate_chars(reply, self.char_bound(n)).trim_end(),
            None => reply,
        };

        debug!(
            provider = self.provider.name(),
            model = %response.model,
            chars = reply.chars().count(),
            "Completion received"
        );
        Ok(reply.to_string())
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("embedding response was empty".into()))
    }
}
