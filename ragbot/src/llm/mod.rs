//! LLM client abstraction used by the RAG chains.
//!
//! [`LlmClient`] takes a message list and returns assistant text plus optional
//! tool calls. [`ChatOpenAI`] talks to an OpenAI-compatible API; [`MockLlm`]
//! replays scripted replies in tests. Structured output (router decisions,
//! grader scores) goes through [`structured`].

mod mock;
mod openai;
pub mod structured;

pub use mock::{MockLlm, MockReply};
pub use openai::ChatOpenAI;
pub use structured::{invoke_structured, parse_structured, StructuredOutput};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;

/// Tool choice mode for chat completions when tools are present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    /// Model picks between a message and tool calls.
    #[default]
    Auto,
    /// Model will not call any tool.
    None,
    /// Model must call a tool.
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

/// Function tool offered to the model: name, description and JSON schema of its arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Tool call returned by the model; `arguments` is the raw JSON string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: String,
    pub id: Option<String>,
}

/// Token usage for one LLM call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from one completion.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// LLM client: given messages, returns assistant text and optional tool calls.
///
/// **Interaction**: Held as `Arc<dyn LlmClient>` by every chain; `None` there means offline mode.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;
}
