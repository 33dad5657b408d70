use crate::{clamp_timeout_ms, classify_transport, env_nonblank, snippet};
use prospect_core::{ChatMessage, ChatOutcome, Error, LlmBackend, Result, ToolCall, ToolSpec};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

fn openai_api_key_from_env() -> Option<String> {
    env_nonblank("PROSPECT_OPENAI_API_KEY").or_else(|| env_nonblank("OPENAI_API_KEY"))
}

fn openai_base_url_from_env() -> String {
    env_nonblank("PROSPECT_OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com".to_string())
}

fn openai_model_from_env() -> String {
    env_nonblank("PROSPECT_OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

/// Chat-completions backend. Temperature defaults to zero: research calls
/// should be as repeatable as the upstream service allows.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: openai_base_url_from_env(),
            api_key: api_key.into(),
            model: openai_model_from_env(),
            temperature: 0.0,
        }
    }

    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = openai_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured("missing PROSPECT_OPENAI_API_KEY (or OPENAI_API_KEY)".to_string())
        })?;
        Ok(Self::new(client, api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_chat_completions(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(
        &self,
        req: &ChatCompletionsRequest,
        timeout_ms: u64,
    ) -> Result<ChatCompletionsResponse> {
        let timeout_ms = clamp_timeout_ms(timeout_ms);
        let resp = self
            .client
            .post(self.endpoint_chat_completions())
            .timeout(Duration::from_millis(timeout_ms))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| classify_transport(e, "openai chat.completions"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                context: format!("openai chat.completions: {}", snippet(&body, 200)),
            });
        }

        resp.json()
            .await
            .map_err(|e| Error::Llm(format!("decode chat.completions response: {e}")))
    }

    fn first_message(parsed: ChatCompletionsResponse) -> Result<ChoiceMessage> {
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::Llm("chat.completions returned no choices".to_string()))
    }
}

#[async_trait::async_trait]
impl LlmBackend for OpenAiClient {
    async fn complete(&self, system: &str, user: &str, timeout_ms: u64) -> Result<String> {
        let req = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![
                wire_message(&ChatMessage::system(system)),
                wire_message(&ChatMessage::user(user)),
            ],
            tools: Vec::new(),
            temperature: self.temperature,
            stream: Some(false),
        };
        let msg = Self::first_message(self.send(&req, timeout_ms).await?)?;
        msg.content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Llm("chat.completions returned no content".to_string()))
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
        timeout_ms: u64,
    ) -> Result<ChatOutcome> {
        let req = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: messages.iter().map(wire_message).collect(),
            tools: tools.iter().map(wire_tool).collect(),
            temperature: self.temperature,
            stream: Some(false),
        };
        let msg = Self::first_message(self.send(&req, timeout_ms).await?)?;

        if !msg.tool_calls.is_empty() {
            let calls = msg
                .tool_calls
                .into_iter()
                .map(|tc| ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments: tc.function.arguments,
                })
                .collect();
            return Ok(ChatOutcome::ToolCalls(calls));
        }
        match msg.content {
            Some(content) if !content.trim().is_empty() => Ok(ChatOutcome::Message(content)),
            _ => Err(Error::Llm(
                "chat.completions returned neither content nor tool calls".to_string(),
            )),
        }
    }
}

fn wire_message(m: &ChatMessage) -> WireMessage {
    match m {
        ChatMessage::System(content) => WireMessage {
            role: "system",
            content: Some(content.clone()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        },
        ChatMessage::User(content) => WireMessage {
            role: "user",
            content: Some(content.clone()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        },
        ChatMessage::Assistant {
            content,
            tool_calls,
        } => WireMessage {
            role: "assistant",
            content: content.clone(),
            tool_calls: tool_calls
                .iter()
                .map(|tc| WireToolCall {
                    id: tc.id.clone(),
                    kind: "function".to_string(),
                    function: WireFunctionCall {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
                .collect(),
            tool_call_id: None,
        },
        ChatMessage::Tool {
            tool_call_id,
            content,
        } => WireMessage {
            role: "tool",
            content: Some(content.clone()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.clone()),
        },
    }
}

fn wire_tool(spec: &ToolSpec) -> WireTool {
    WireTool {
        kind: "function",
        function: WireToolDef {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.parameters.clone(),
        },
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Clone, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireToolDef,
}

#[derive(Debug, Clone, Serialize)]
struct WireToolDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}
