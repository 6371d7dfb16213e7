//! Web capabilities for TaskScout.
//!
//! Tools give the agent access to up-to-date information:
//! search the web for URLs, then fetch each page and reduce it to the
//! text a reader would see.

pub mod html;
pub mod web_fetch;
pub mod web_search;

pub use web_fetch::HttpPageFetcher;
pub use web_search::GoogleSearch;

use std::sync::Arc;
use std::time::Duration;
use taskscout_config::AppConfig;
use taskscout_core::error::WebError;
use taskscout_core::web::{PageFetcher, SearchEngine};

/// Build the search engine described by the configuration.
///
/// Fails with `NotConfigured` when the Google key or engine id is missing.
pub fn search_from_config(config: &AppConfig) -> Result<Arc<dyn SearchEngine>, WebError> {
    let api_key = config
        .search
        .api_key
        .clone()
        .ok_or_else(|| WebError::NotConfigured("search.api_key (or GOOGLE_API_KEY) is not set".into()))?;
    let cx = config
        .search
        .cx
        .clone()
        .ok_or_else(|| WebError::NotConfigured("search.cx (or GOOGLE_CX) is not set".into()))?;

    let timeout = Duration::from_secs(config.http.timeout_secs);
    Ok(Arc::new(GoogleSearch::new(api_key, cx).with_timeout(timeout)))
}

/// Build the page fetcher described by the configuration.
pub fn fetcher_from_config(config: &AppConfig) -> Arc<dyn PageFetcher> {
    Arc::new(HttpPageFetcher::new(
        Duration::from_secs(config.http.timeout_secs),
        &config.http.user_agent,
    ))
}
