use crate::splitter::{split_text, SplitterConfig};
use prospect_core::{Error, LlmBackend, Result};
use std::sync::Arc;
use std::time::Duration;

/// Character-length threshold above which scraped content is summarized
/// instead of returned verbatim. A coarse proxy for token length, not an
/// exact budget.
pub const SUMMARY_THRESHOLD_CHARS: usize = 10_000;

const SUMMARY_SYSTEM: &str = "You condense research material. Keep facts, figures, \
names, dates, and links; never invent content.";

/// One template serves both phases: each chunk maps through it, and the
/// combined chunk summaries reduce through it again.
fn summary_prompt(objective: &str, text: &str) -> String {
    format!("Write a summary of the following text for {objective}:\n\"{text}\"\nSUMMARY:")
}

/// Objective-conditioned map-reduce summarizer.
///
/// Long content is split into overlapping windows, each window is summarized
/// independently, and the per-window summaries are combined in one final
/// pass. All calls run through the configured backend at its temperature
/// (zero by default), which minimizes but cannot guarantee reproducibility.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LlmBackend>,
    splitter: SplitterConfig,
    max_attempts: u32,
    timeout_ms: u64,
    backoff_ms: u64,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            llm,
            splitter: SplitterConfig::default(),
            max_attempts: 3,
            timeout_ms: 120_000,
            backoff_ms: 500,
        }
    }

    pub fn with_splitter(mut self, splitter: SplitterConfig) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    /// Summarize `content` for `objective`.
    ///
    /// Failure policy: each model call retries transient errors with
    /// exponential backoff. A chunk whose summary still fails is dropped
    /// with a warning as long as at least one chunk survived; only when
    /// every chunk fails does the error propagate.
    pub async fn summarize(&self, objective: &str, content: &str) -> Result<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::EmptyContent("nothing to summarize".to_string()));
        }

        let chunks = split_text(content, &self.splitter);
        let total = chunks.len();

        let mut partials = Vec::with_capacity(total);
        let mut last_err = None;
        for (i, chunk) in chunks.iter().enumerate() {
            match self
                .complete_with_retry(&summary_prompt(objective, chunk))
                .await
            {
                Ok(s) => partials.push(s),
                Err(e) => {
                    tracing::warn!(chunk = i, total, error = %e, "chunk summary failed; continuing without it");
                    last_err = Some(e);
                }
            }
        }

        if partials.is_empty() {
            return Err(
                last_err.unwrap_or_else(|| Error::Llm("no chunk summaries produced".to_string()))
            );
        }
        if partials.len() < total {
            tracing::warn!(
                kept = partials.len(),
                total,
                "summary is partial; some chunks were dropped"
            );
        }

        // The reduce pass runs even for a single chunk: map output is
        // chunk-shaped, the reduce output is the caller-facing summary.
        let combined = partials.join("\n\n");
        self.complete_with_retry(&summary_prompt(objective, &combined))
            .await
    }

    async fn complete_with_retry(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.llm.complete(SUMMARY_SYSTEM, prompt, self.timeout_ms).await {
                Ok(s) => {
                    let s = s.trim();
                    if s.is_empty() {
                        return Err(Error::Llm("model returned an empty summary".to_string()));
                    }
                    return Ok(s.to_string());
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff_ms.saturating_mul(1u64 << (attempt - 1));
                    tracing::debug!(attempt, delay_ms = delay, error = %e, "retrying summary call");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_core::{ChatMessage, ChatOutcome, ToolSpec};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted backend: pops one canned response per `complete` call and
    /// records the prompts it saw.
    struct ScriptedLlm {
        responses: Mutex<VecDeque<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LlmBackend for ScriptedLlm {
        async fn complete(&self, _system: &str, user: &str, _timeout_ms: u64) -> Result<String> {
            self.prompts.lock().unwrap().push(user.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Llm("script exhausted".to_string())))
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSpec],
            _timeout_ms: u64,
        ) -> Result<ChatOutcome> {
            Err(Error::Llm("chat is not scripted here".to_string()))
        }
    }

    fn summarizer(llm: Arc<ScriptedLlm>, chunk_size: usize, overlap: usize) -> Summarizer {
        Summarizer::new(llm)
            .with_splitter(SplitterConfig::new(chunk_size, overlap).unwrap())
            .with_backoff_ms(1)
    }

    #[tokio::test]
    async fn one_map_call_per_chunk_then_one_reduce_over_all() {
        let text = "a".repeat(25);
        // chunk_size 10, overlap 2 -> chunks at 0..10, 8..18, 16..25
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("s1".to_string()),
            Ok("s2".to_string()),
            Ok("s3".to_string()),
            Ok("final".to_string()),
        ]));
        let out = summarizer(llm.clone(), 10, 2)
            .summarize("the objective", &text)
            .await
            .unwrap();
        assert_eq!(out, "final");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 4, "three map calls plus one reduce");
        let reduce = prompts.last().unwrap();
        for s in ["s1", "s2", "s3"] {
            assert!(reduce.contains(s), "reduce prompt missing {s}: {reduce:?}");
        }
        assert!(reduce.contains("the objective"));
    }

    #[tokio::test]
    async fn short_content_still_runs_map_and_reduce() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("mapped".to_string()),
            Ok("reduced".to_string()),
        ]));
        let out = summarizer(llm.clone(), 100, 10)
            .summarize("obj", "tiny content")
            .await
            .unwrap();
        assert_eq!(out, "reduced");
        assert_eq!(llm.prompts().len(), 2);
    }

    #[tokio::test]
    async fn retries_transient_failures_with_backoff() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Err(Error::Network("connection reset".to_string())),
            Ok("mapped".to_string()),
            Ok("reduced".to_string()),
        ]));
        let out = summarizer(llm.clone(), 100, 10)
            .summarize("obj", "tiny content")
            .await
            .unwrap();
        assert_eq!(out, "reduced");
        assert_eq!(llm.prompts().len(), 3, "one retry, then map + reduce");
    }

    #[tokio::test]
    async fn partial_fallback_reduces_over_surviving_chunks() {
        let text = "a".repeat(18);
        // chunk_size 10, overlap 2 -> two chunks.
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok("kept".to_string()),
            Err(Error::InvalidInput("permanently broken".to_string())),
            Ok("reduced".to_string()),
        ]));
        let out = summarizer(llm.clone(), 10, 2)
            .summarize("obj", &text)
            .await
            .unwrap();
        assert_eq!(out, "reduced");
        let prompts = llm.prompts();
        let reduce = prompts.last().unwrap();
        assert!(reduce.contains("kept"));
        assert!(!reduce.contains("permanently broken"));
    }

    #[tokio::test]
    async fn propagates_when_every_chunk_fails() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(Error::Llm(
            "model unavailable".to_string(),
        ))]));
        match summarizer(llm, 100, 10).summarize("obj", "content").await {
            Err(Error::Llm(_)) => {}
            other => panic!("expected Llm error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_content_is_empty_content() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        match summarizer(llm, 100, 10).summarize("obj", "   ").await {
            Err(Error::EmptyContent(_)) => {}
            other => panic!("expected EmptyContent, got {other:?}"),
        }
    }
}
