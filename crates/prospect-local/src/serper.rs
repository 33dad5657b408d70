use crate::{clamp_timeout_ms, classify_transport, env_nonblank, snippet};
use prospect_core::{Error, Result};
use std::time::Duration;

fn serper_api_key_from_env() -> Option<String> {
    env_nonblank("PROSPECT_SERPER_API_KEY").or_else(|| env_nonblank("SERPER_API_KEY"))
}

fn serper_endpoint_from_env() -> String {
    // For tests / enterprise proxies, allow overriding the endpoint.
    env_nonblank("PROSPECT_SERPER_ENDPOINT")
        .unwrap_or_else(|| "https://google.serper.dev/search".to_string())
}

#[derive(Debug, Clone)]
pub struct SerperClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl SerperClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: serper_endpoint_from_env(),
        }
    }

    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = serper_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured("missing PROSPECT_SERPER_API_KEY (or SERPER_API_KEY)".to_string())
        })?;
        Ok(Self::new(client, api_key))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// One search round trip. The response body is passed through unparsed;
    /// the model consumes the provider's JSON directly. No retries.
    pub async fn search(&self, query: &str, timeout_ms: u64) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput(
                "search query must be non-empty".to_string(),
            ));
        }
        let timeout_ms = clamp_timeout_ms(timeout_ms);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&serde_json::json!({ "q": query }))
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| classify_transport(e, "serper search"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| classify_transport(e, "serper search body"))?;
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                context: format!("serper search: {}", snippet(&body, 200)),
            });
        }

        tracing::debug!(bytes = body.len(), "serper search response");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvGuard {
        k: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(k: &'static str, v: &str) -> Self {
            let prev = std::env::var(k).ok();
            std::env::set_var(k, v);
            Self { k, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(v) = self.prev.take() {
                std::env::set_var(self.k, v);
            } else {
                std::env::remove_var(self.k);
            }
        }
    }

    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn empty_api_key_is_treated_as_missing() {
        let _g1 = EnvGuard::set("PROSPECT_SERPER_API_KEY", "");
        let _g2 = EnvGuard::set("SERPER_API_KEY", "   ");
        assert!(serper_api_key_from_env().is_none());
    }

    #[tokio::test]
    async fn blank_query_is_invalid_input() {
        let client = SerperClient::new(reqwest::Client::new(), "test-key");
        match client.search("   ", 5_000).await {
            Err(Error::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn passes_through_raw_response_text() {
        let raw = r#"{"organic":[{"title":"Example","link":"https://example.com"}]}"#;
        let app = axum::Router::new().route(
            "/search",
            axum::routing::post(move || async move { raw }),
        );
        let base = serve(app).await;

        let client = SerperClient::new(reqwest::Client::new(), "test-key")
            .with_endpoint(format!("{base}/search"));
        let out = client.search("example", 5_000).await.unwrap();
        assert_eq!(out, raw);
    }

    #[tokio::test]
    async fn non_success_maps_to_upstream_status_with_body_snippet() {
        use axum::http::StatusCode;
        let app = axum::Router::new().route(
            "/search",
            axum::routing::post(|| async { (StatusCode::FORBIDDEN, "bad api key") }),
        );
        let base = serve(app).await;

        let client = SerperClient::new(reqwest::Client::new(), "wrong-key")
            .with_endpoint(format!("{base}/search"));
        match client.search("example", 5_000).await {
            Err(Error::UpstreamStatus { status, context }) => {
                assert_eq!(status, 403);
                assert!(context.contains("bad api key"), "context={context:?}");
            }
            other => panic!("expected UpstreamStatus, got {other:?}"),
        }
    }
}
