//! Configuration loading, validation, and management for TaskScout.
//!
//! Loads configuration from `~/.taskscout/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! `AppConfig` is handed to capability constructors explicitly; nothing
//! downstream reads the environment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.taskscout/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default completion model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Model used for semantic ranking embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Outbound HTTP settings shared by all network capabilities
    #[serde(default)]
    pub http: HttpConfig,

    /// Context-building pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    400
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("embedding_model", &self.embedding_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("search", &self.search)
            .field("http", &self.http)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Google Custom Search credentials and result count.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom search engine id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cx: Option<String>,

    /// How many URLs to read per search
    #[serde(default = "default_search_results")]
    pub results: usize,
}

fn default_search_results() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            cx: None,
            results: default_search_results(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("cx", &self.cx)
            .field("results", &self.results)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    60
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.63 Safari/537.3".into()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// How scraped pages are turned into task context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// Pull the sentences most similar to the task (embedding ranking)
    #[default]
    Rank,
    /// Compress the whole merged text with the batch summarizer
    Summarize,
}

impl std::str::FromStr for ContextMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rank" => Ok(Self::Rank),
            "summarize" | "summary" => Ok(Self::Summarize),
            other => Err(ConfigError::ValidationError(format!(
                "unknown context mode '{other}' (expected 'rank' or 'summarize')"
            ))),
        }
    }
}

/// Tuning for the summarize / rank pipeline.
///
/// Character budgets are targets given to the model; they are not exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub context_mode: ContextMode,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_unit_summary_chars")]
    pub unit_summary_chars: usize,

    #[serde(default = "default_final_summary_chars")]
    pub final_summary_chars: usize,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Intermediate summaries longer than this get split and re-summarized
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: usize,

    #[serde(default = "default_compression_parts")]
    pub compression_parts: usize,

    #[serde(default = "default_part_summary_chars")]
    pub part_summary_chars: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_embed_concurrency")]
    pub embed_concurrency: usize,

    /// Characters kept from each fetched page before merging
    #[serde(default = "default_page_char_limit")]
    pub page_char_limit: usize,

    /// Allowed model overshoot on a character budget, as a fraction
    #[serde(default = "default_overshoot_slack")]
    pub overshoot_slack: f32,
}

fn default_batch_size() -> usize {
    1000
}
fn default_unit_summary_chars() -> usize {
    50
}
fn default_final_summary_chars() -> usize {
    100
}
fn default_max_concurrency() -> usize {
    8
}
fn default_compression_threshold() -> usize {
    2000
}
fn default_compression_parts() -> usize {
    4
}
fn default_part_summary_chars() -> usize {
    30
}
fn default_top_k() -> usize {
    3
}
fn default_embed_concurrency() -> usize {
    10
}
fn default_page_char_limit() -> usize {
    1000
}
fn default_overshoot_slack() -> f32 {
    0.2
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_mode: ContextMode::default(),
            batch_size: default_batch_size(),
            unit_summary_chars: default_unit_summary_chars(),
            final_summary_chars: default_final_summary_chars(),
            max_concurrency: default_max_concurrency(),
            compression_threshold: default_compression_threshold(),
            compression_parts: default_compression_parts(),
            part_summary_chars: default_part_summary_chars(),
            top_k: default_top_k(),
            embed_concurrency: default_embed_concurrency(),
            page_char_limit: default_page_char_limit(),
            overshoot_slack: default_overshoot_slack(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.taskscout/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TASKSCOUT_API_KEY` (highest priority), `OPENAI_API_KEY`, `OPENROUTER_API_KEY`
    /// - `TASKSCOUT_PROVIDER`, `TASKSCOUT_MODEL`
    /// - `GOOGLE_API_KEY` / `API_KEY` and `GOOGLE_CX` / `CX` for search
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    ///
    /// Keys already present in the file win for secrets; provider and model
    /// overrides always win.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(*k).filter(|v| !v.is_empty()));

        if self.api_key.is_none() {
            self.api_key = first(&["TASKSCOUT_API_KEY", "OPENAI_API_KEY", "OPENROUTER_API_KEY"]);
        }
        if let Some(provider) = first(&["TASKSCOUT_PROVIDER"]) {
            self.default_provider = provider;
        }
        if let Some(model) = first(&["TASKSCOUT_MODEL"]) {
            self.default_model = model;
        }
        if self.search.api_key.is_none() {
            self.search.api_key = first(&["GOOGLE_API_KEY", "API_KEY"]);
        }
        if self.search.cx.is_none() {
            self.search.cx = first(&["GOOGLE_CX", "CX"]);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".taskscout")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let p = &self.pipeline;
        let positive = [
            ("pipeline.batch_size", p.batch_size),
            ("pipeline.unit_summary_chars", p.unit_summary_chars),
            ("pipeline.final_summary_chars", p.final_summary_chars),
            ("pipeline.max_concurrency", p.max_concurrency),
            ("pipeline.compression_parts", p.compression_parts),
            ("pipeline.part_summary_chars", p.part_summary_chars),
            ("pipeline.embed_concurrency", p.embed_concurrency),
            ("pipeline.page_char_limit", p.page_char_limit),
            ("search.results", self.search.results),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::ValidationError(format!("{name} must be > 0")));
        }

        if p.overshoot_slack < 0.0 {
            return Err(ConfigError::ValidationError(
                "pipeline.overshoot_slack must be >= 0".into(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Check if web search credentials are available.
    pub fn has_search_credentials(&self) -> bool {
        self.search.api_key.is_some() && self.search.cx.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            embedding_model: default_embedding_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            search: SearchConfig::default(),
            http: HttpConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
