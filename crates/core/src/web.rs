//! Web capability traits: search and page fetching.
//!
//! These give the agent access to up-to-date information. The agent only
//! ever needs two things from the web: a list of URLs for a query, and the
//! visible text behind a URL.

use async_trait::async_trait;
use crate::error::WebError;

/// Returned by fetchers when the URL does not serve HTML.
pub const NOT_HTML_PLACEHOLDER: &str = "Not an HTML file";

/// A web search backend (Google Custom Search, Brave, ...).
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// A human-readable name (e.g., "google").
    fn name(&self) -> &str;

    /// Return up to `count` result URLs for `query`, best first.
    ///
    /// An empty result set is not an error.
    async fn search(&self, query: &str, count: usize) -> std::result::Result<Vec<String>, WebError>;
}

/// Retrieves a page and reduces it to its visible body text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its visible text.
    ///
    /// - HTML pages yield whitespace-collapsed body text (empty if no body)
    /// - other content types yield [`NOT_HTML_PLACEHOLDER`]
    /// - network failures are returned as errors; callers decide how to degrade
    async fn fetch(&self, url: &str) -> std::result::Result<String, WebError>;
}
