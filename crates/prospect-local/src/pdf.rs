use crate::summarize::{Summarizer, SUMMARY_THRESHOLD_CHARS};
use crate::{clamp_timeout_ms, classify_transport, snippet};
use prospect_core::{Error, Result};
use std::time::Duration;

/// Hard cap on PDF body size; beyond this, extraction cost and memory use
/// stop being worth it for a research tool call.
const MAX_PDF_BYTES: usize = 20_000_000;

/// One page of extracted text, 1-based, in source order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PdfPage {
    pub number: usize,
    pub text: String,
}

/// Loads a PDF from a local path or an http(s) URL into per-page text.
#[derive(Debug, Clone)]
pub struct PdfLoader {
    client: reqwest::Client,
}

impl PdfLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn load(&self, target: &str, timeout_ms: u64) -> Result<Vec<PdfPage>> {
        let target = target.trim();
        if target.is_empty() {
            return Err(Error::InvalidInput("pdf target must be non-empty".to_string()));
        }

        let bytes = if is_http_url(target) {
            self.fetch(target, timeout_ms).await?
        } else {
            std::fs::read(target).map_err(|e| Error::Pdf(format!("read {target}: {e}")))?
        };
        if bytes.len() > MAX_PDF_BYTES {
            return Err(Error::Pdf(format!(
                "{target}: {} bytes exceeds the {MAX_PDF_BYTES}-byte cap",
                bytes.len()
            )));
        }

        let texts = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| Error::Pdf(format!("{target}: {e}")))?;
        let pages: Vec<PdfPage> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PdfPage {
                number: i + 1,
                text,
            })
            .collect();

        if pages.is_empty() || pages.iter().all(|p| p.text.trim().is_empty()) {
            return Err(Error::EmptyContent(format!(
                "no extractable text in {target}"
            )));
        }
        tracing::debug!(pages = pages.len(), target, "loaded pdf");
        Ok(pages)
    }

    async fn fetch(&self, url: &str, timeout_ms: u64) -> Result<Vec<u8>> {
        let timeout_ms = clamp_timeout_ms(timeout_ms);
        let resp = self
            .client
            .get(url)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| classify_transport(e, "pdf fetch"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                context: format!("pdf fetch for {url}: {}", snippet(&body, 200)),
            });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| classify_transport(e, "pdf fetch body"))?;
        Ok(bytes.to_vec())
    }
}

fn is_http_url(target: &str) -> bool {
    url::Url::parse(target)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// What a PDF scrape hands back: the raw pages when the document is small,
/// one objective-conditioned summary when it is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfScrape {
    Pages(Vec<PdfPage>),
    Summary(String),
}

pub struct PdfScraper {
    loader: PdfLoader,
    summarizer: Summarizer,
}

impl PdfScraper {
    pub fn new(loader: PdfLoader, summarizer: Summarizer) -> Self {
        Self { loader, summarizer }
    }

    /// Pages when the total extracted text is under the summary threshold,
    /// a summary otherwise. The threshold compares character length, the
    /// same basis the web scraper uses.
    pub async fn scrape(
        &self,
        objective: &str,
        filename: &str,
        timeout_ms: u64,
    ) -> Result<PdfScrape> {
        let pages = self.loader.load(filename, timeout_ms).await?;
        self.reduce_pages(objective, pages).await
    }

    /// Targeted question answering over a document: always summarize against
    /// the objective, regardless of size.
    pub async fn search(
        &self,
        objective: &str,
        filename: &str,
        timeout_ms: u64,
    ) -> Result<String> {
        let pages = self.loader.load(filename, timeout_ms).await?;
        self.summarizer
            .summarize(objective, &join_pages(&pages))
            .await
    }

    async fn reduce_pages(&self, objective: &str, pages: Vec<PdfPage>) -> Result<PdfScrape> {
        let total_chars: usize = pages.iter().map(|p| p.text.chars().count()).sum();
        if total_chars > SUMMARY_THRESHOLD_CHARS {
            tracing::debug!(
                total_chars,
                pages = pages.len(),
                "pdf text over threshold; summarizing"
            );
            let summary = self
                .summarizer
                .summarize(objective, &join_pages(&pages))
                .await?;
            return Ok(PdfScrape::Summary(summary));
        }
        Ok(PdfScrape::Pages(pages))
    }
}

fn join_pages(pages: &[PdfPage]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
