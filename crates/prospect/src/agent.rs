use crate::memory::ConversationMemory;
use crate::prompts;
use crate::tools::ToolRegistry;
use prospect_core::{ChatMessage, ChatOutcome, Error, LlmBackend, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Hard upper bound on tool-call rounds. The prompt also asks the model
    /// to stay under this, but the loop counter is what enforces it.
    pub max_iterations: usize,
    pub llm_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            llm_timeout_ms: 120_000,
        }
    }
}

/// The research loop: select a tool, run it, observe, repeat (bounded by
/// `max_iterations`), then finalize.
pub struct ResearchAgent {
    llm: Arc<dyn LlmBackend>,
    tools: ToolRegistry,
    memory: Mutex<ConversationMemory>,
    config: AgentConfig,
}

impl ResearchAgent {
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        tools: ToolRegistry,
        memory: ConversationMemory,
        config: AgentConfig,
    ) -> Self {
        Self {
            llm,
            tools,
            memory: Mutex::new(memory),
            config,
        }
    }

    pub async fn run(&self, objective: &str) -> Result<String> {
        let objective = objective.trim();
        if objective.is_empty() {
            return Err(Error::InvalidInput(
                "research goal must be non-empty".to_string(),
            ));
        }

        let specs = ToolRegistry::specs();
        let mut messages = vec![ChatMessage::system(prompts::SYSTEM_PROMPT)];
        messages.extend(self.memory.lock().await.context_messages());
        messages.push(ChatMessage::user(objective));

        for iteration in 0..self.config.max_iterations {
            match self
                .llm
                .chat(&messages, &specs, self.config.llm_timeout_ms)
                .await?
            {
                ChatOutcome::Message(text) => {
                    tracing::info!(iteration, "research finalized");
                    self.memory.lock().await.record(objective, &text).await;
                    return Ok(text);
                }
                ChatOutcome::ToolCalls(calls) => {
                    tracing::info!(
                        iteration,
                        tools = calls.len(),
                        "executing requested tool calls"
                    );
                    messages.push(ChatMessage::Assistant {
                        content: None,
                        tool_calls: calls.clone(),
                    });
                    for call in &calls {
                        let content = match self.tools.dispatch(call).await {
                            Ok(output) => output,
                            Err(e) => {
                                // The failure goes back to the model as the tool
                                // result so it can report or route around it.
                                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                                format!("tool '{}' failed: {e}", call.name)
                            }
                        };
                        messages.push(ChatMessage::tool_result(call.id.as_str(), content));
                    }
                }
            }
        }

        tracing::info!(
            max_iterations = self.config.max_iterations,
            "iteration cap reached; forcing finalization"
        );
        messages.push(ChatMessage::user(prompts::FINALIZE_PROMPT));
        match self
            .llm
            .chat(&messages, &[], self.config.llm_timeout_ms)
            .await?
        {
            ChatOutcome::Message(text) => {
                self.memory.lock().await.record(objective, &text).await;
                Ok(text)
            }
            ChatOutcome::ToolCalls(_) => Err(Error::Llm(
                "model requested tools after finalization".to_string(),
            )),
        }
    }
}
