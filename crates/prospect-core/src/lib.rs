use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("upstream HTTP {status}: {context}")]
    UpstreamStatus { status: u16, context: String },
    #[error("empty content: {0}")]
    EmptyContent(String),
    #[error("llm failed: {0}")]
    Llm(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("pdf error: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Transient failures worth retrying. Everything else is treated as
    /// permanent: retrying a 401 or a malformed-arguments error just burns
    /// upstream quota.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout(_) => true,
            Error::UpstreamStatus { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

/// A named, schema-described callable offered to the model.
///
/// `parameters` is a JSON Schema object generated from the tool's typed
/// argument struct. Specs are immutable once built; the agent loop passes
/// them verbatim on every chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments object, exactly as the model produced it.
    pub arguments: String,
}

/// The minimal message alphabet for a function-calling conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User(content.into())
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

/// What one chat turn produced: a final text, or tool invocations to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Message(String),
    ToolCalls(Vec<ToolCall>),
}

#[async_trait::async_trait]
pub trait LlmBackend: Send + Sync {
    /// One plain completion (no tools). Used by the summarizer and by
    /// conversation-memory condensation.
    async fn complete(&self, system: &str, user: &str, timeout_ms: u64) -> Result<String>;

    /// One function-calling turn over an explicit message history.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
        timeout_ms: u64,
    ) -> Result<ChatOutcome>;
}
