use crate::{clamp_timeout_ms, classify_transport, env_nonblank, snippet};
use prospect_core::{Error, Result};
use std::time::Duration;

fn browserless_api_key_from_env() -> Option<String> {
    env_nonblank("PROSPECT_BROWSERLESS_API_KEY").or_else(|| env_nonblank("BROWSERLESS_API_KEY"))
}

fn browserless_endpoint_from_env() -> String {
    env_nonblank("PROSPECT_BROWSERLESS_ENDPOINT")
        .unwrap_or_else(|| "https://chrome.browserless.io/content".to_string())
}

/// Client for a hosted browser-rendering endpoint: give it a URL, get back
/// the HTML the page renders to (scripts executed upstream).
#[derive(Debug, Clone)]
pub struct BrowserlessClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl BrowserlessClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: browserless_endpoint_from_env(),
        }
    }

    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = browserless_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured(
                "missing PROSPECT_BROWSERLESS_API_KEY (or BROWSERLESS_API_KEY)".to_string(),
            )
        })?;
        Ok(Self::new(client, api_key))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fetch the rendered HTML for `url`. Non-2xx is a typed failure, never
    /// an implicit empty result.
    pub async fn content(&self, url: &str, timeout_ms: u64) -> Result<String> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidInput("scrape url must be non-empty".to_string()));
        }
        reqwest::Url::parse(url).map_err(|e| Error::InvalidInput(format!("bad url {url:?}: {e}")))?;
        let timeout_ms = clamp_timeout_ms(timeout_ms);

        // The upstream contract authenticates via a token query parameter.
        let post_url = format!("{}?token={}", self.endpoint, self.api_key);
        let resp = self
            .client
            .post(post_url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&serde_json::json!({ "url": url }))
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| classify_transport(e, "browserless content"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| classify_transport(e, "browserless content body"))?;
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                context: format!("browserless content for {url}: {}", snippet(&body, 200)),
            });
        }

        tracing::debug!(bytes = body.len(), url, "browserless rendered page");
        Ok(body)
    }
}
