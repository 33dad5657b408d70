use crate::prompts;
use prospect_core::{ChatMessage, LlmBackend, Result};
use std::sync::Arc;

/// Coarse tokens-per-character divisor. Good enough for a budget check;
/// nothing downstream depends on it being exact.
const CHARS_PER_TOKEN: usize = 4;
const DEFAULT_MAX_TOKENS: usize = 10_000;
const CONDENSE_TIMEOUT_MS: u64 = 60_000;

struct Exchange {
    objective: String,
    answer: String,
}

impl Exchange {
    fn chars(&self) -> usize {
        self.objective.chars().count() + self.answer.chars().count()
    }
}

/// Rolling summarized history of completed research exchanges, bounded by an
/// approximate token budget. Owned and mutated only by the agent loop,
/// sequentially within a query's lifetime.
pub struct ConversationMemory {
    llm: Arc<dyn LlmBackend>,
    max_tokens: usize,
    summary: Option<String>,
    exchanges: Vec<Exchange>,
}

impl ConversationMemory {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            llm,
            max_tokens: DEFAULT_MAX_TOKENS,
            summary: None,
            exchanges: Vec::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    fn estimated_tokens(&self) -> usize {
        let summary_chars = self
            .summary
            .as_ref()
            .map(|s| s.chars().count())
            .unwrap_or(0);
        let turn_chars: usize = self.exchanges.iter().map(Exchange::chars).sum();
        (summary_chars + turn_chars).div_ceil(CHARS_PER_TOKEN)
    }

    /// Record a completed exchange, folding the oldest exchanges into the
    /// rolling summary while over budget. Maintenance is best-effort: a
    /// failed condensation degrades to dropping the oldest exchange, never
    /// to failing the query that just finished.
    pub async fn record(&mut self, objective: &str, answer: &str) {
        self.exchanges.push(Exchange {
            objective: objective.to_string(),
            answer: answer.to_string(),
        });

        while self.estimated_tokens() > self.max_tokens && !self.exchanges.is_empty() {
            let oldest = self.exchanges.remove(0);
            match self.condense(&oldest).await {
                Ok(updated) => self.summary = Some(updated),
                Err(e) => {
                    tracing::warn!(error = %e, "memory condensation failed; dropping oldest exchange");
                }
            }
        }
    }

    async fn condense(&self, exchange: &Exchange) -> Result<String> {
        let current = self.summary.as_deref().unwrap_or("(none)");
        let prompt = prompts::condense_prompt(current, &exchange.objective, &exchange.answer);
        self.llm
            .complete(prompts::CONDENSE_SYSTEM, &prompt, CONDENSE_TIMEOUT_MS)
            .await
    }

    /// Context for a new query: the rolling summary (if any), then retained
    /// exchanges oldest first.
    pub fn context_messages(&self) -> Vec<ChatMessage> {
        let mut out = Vec::new();
        if let Some(summary) = &self.summary {
            out.push(ChatMessage::system(format!(
                "Summary of earlier research sessions:\n{summary}"
            )));
        }
        for e in &self.exchanges {
            out.push(ChatMessage::user(e.objective.clone()));
            out.push(ChatMessage::assistant_text(e.answer.clone()));
        }
        out
    }
}
