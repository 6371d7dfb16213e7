//! Error types for the TaskScout domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all TaskScout operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Context pipeline errors ---
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the language-model capabilities (completion and embedding).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The upstream answered 200 but the body was not the expected shape.
    #[error("Malformed response from provider: {0}")]
    MalformedResponse(String),
}

/// Failures of the web capabilities (search and page fetch).
#[derive(Debug, Clone, Error)]
pub enum WebError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Web capability not configured: {0}")]
    NotConfigured(String),

    #[error("Malformed response from {service}: {reason}")]
    MalformedResponse { service: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Failures of the context-building pipeline.
///
/// Per-item failures inside a concurrent stage never show up here; they are
/// absorbed where they happen. Only whole-pipeline outcomes are reported.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Nothing to work with: no URLs, no fetched text, or an empty document.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// The final, non-batched compression call failed.
    #[error("Final compression failed: {0}")]
    Compression(#[from] ProviderError),
}
