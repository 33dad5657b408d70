use crate::browserless::BrowserlessClient;
use crate::extract::{self, TEXT_WIDTH};
use crate::summarize::{Summarizer, SUMMARY_THRESHOLD_CHARS};
use prospect_core::{Error, Result};

/// Fetch a rendered page and reduce it to text the agent can consume:
/// visible text when small, an objective-conditioned summary when large.
#[derive(Clone)]
pub struct WebScraper {
    browserless: BrowserlessClient,
    summarizer: Summarizer,
}

impl WebScraper {
    pub fn new(browserless: BrowserlessClient, summarizer: Summarizer) -> Self {
        Self {
            browserless,
            summarizer,
        }
    }

    pub async fn scrape(&self, objective: &str, url: &str, timeout_ms: u64) -> Result<String> {
        let html = self.browserless.content(url, timeout_ms).await?;
        let text = extract::html_to_text(&html, TEXT_WIDTH);
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyContent(format!("no visible text at {url}")));
        }

        let chars = text.chars().count();
        if chars > SUMMARY_THRESHOLD_CHARS {
            tracing::debug!(chars, url, "scraped text over threshold; summarizing");
            return self.summarizer.summarize(objective, text).await;
        }
        Ok(text.to_string())
    }
}
