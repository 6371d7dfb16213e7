//! Web search via the Google Custom Search JSON API.
//!
//! `GET {base}/customsearch/v1?key=..&cx=..&q=..&num=..` returns an `items`
//! array whose `link` fields are the result URLs. A response without `items`
//! simply means no results.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use taskscout_core::error::WebError;
use taskscout_core::web::SearchEngine;
use tracing::{debug, warn};

const GOOGLE_API_BASE: &str = "https://www.googleapis.com";

/// The API rejects `num` outside 1..=10.
const MAX_RESULTS_PER_QUERY: usize = 10;

pub struct GoogleSearch {
    api_key: String,
    cx: String,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleSearch {
    pub fn new(api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            cx: cx.into(),
            base_url: GOOGLE_API_BASE.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the engine at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Ok(client) = reqwest::Client::builder().timeout(timeout).build() {
            self.client = client;
        }
        self
    }
}

#[async_trait]
impl SearchEngine for GoogleSearch {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str, count: usize) -> Result<Vec<String>, WebError> {
        if query.trim().is_empty() || count == 0 {
            return Ok(Vec::new());
        }

        let num = count.min(MAX_RESULTS_PER_QUERY).to_string();
        let url = format!("{}/customsearch/v1", self.base_url);

        debug!(query, num = %num, "Searching the web");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WebError::Timeout(e.to_string())
                } else {
                    WebError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Search API returned error");
            return Err(WebError::MalformedResponse {
                service: self.name().into(),
                reason: format!("HTTP {status}"),
            });
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| WebError::MalformedResponse {
            service: self.name().into(),
            reason: e.to_string(),
        })?;

        let links: Vec<String> = parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| item.link)
            .take(count)
            .collect();

        debug!(results = links.len(), "Search complete");
        Ok(links)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    link: Option<String>,
}
