//! HTTP page fetcher: downloads a URL and returns its visible text.

use async_trait::async_trait;
use std::time::Duration;
use taskscout_core::error::WebError;
use taskscout_core::web::{PageFetcher, NOT_HTML_PLACEHOLDER};
use tracing::debug;

use crate::html::extract_visible_text;

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, WebError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| WebError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WebError::InvalidUrl(format!("{url}: unsupported scheme")));
        }

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                WebError::Timeout(format!("{url}: {e}"))
            } else {
                WebError::Network(format!("{url}: {e}"))
            }
        })?;

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        if !is_html {
            debug!(url, "Skipping non-HTML content");
            return Ok(NOT_HTML_PLACEHOLDER.to_string());
        }

        let body = response
            .text()
            .await
            .map_err(|e| WebError::Network(format!("{url}: {e}")))?;

        let text = extract_visible_text(&body);
        debug!(url, chars = text.chars().count(), "Fetched page");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpPageFetcher {
        HttpPageFetcher::new(Duration::from_secs(5), "TaskScoutTest/1.0")
    }

    #[tokio::test]
    async fn fetches_visible_text_from_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .and(header("User-Agent", "TaskScoutTest/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><script>track()</script><p>Hello   world.</p></body></html>",
                "text/html; charset=utf-8",
            ))
            .mount(&server)
            .await;

        let text = fetcher()
            .fetch(&format!("{}/article", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, "Hello world.");
    }

    #[tokio::test]
    async fn non_html_yields_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/report.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
            .mount(&server)
            .await;

        let text = fetcher()
            .fetch(&format!("{}/report.pdf", server.uri()))
            .await
            .unwrap();
        assert_eq!(text, NOT_HTML_PLACEHOLDER);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let err = fetcher().fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, WebError::Network(_) | WebError::Timeout(_)));
    }

    #[tokio::test]
    async fn invalid_url_rejected() {
        let err = fetcher().fetch("not a url").await.unwrap_err();
        assert!(matches!(err, WebError::InvalidUrl(_)));

        let err = fetcher().fetch("ftp://example.com/file").await.unwrap_err();
        assert!(matches!(err, WebError::InvalidUrl(_)));
    }
}
