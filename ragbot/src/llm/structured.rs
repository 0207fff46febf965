//! Structured output: typed replies from a chat model.
//!
//! The target type's JSON schema is offered to the model as a single function
//! tool ([`ChatOpenAI::with_structured_output`](super::ChatOpenAI::with_structured_output)).
//! The reply is read from the matching tool call's arguments, or failing that
//! from a JSON object in the message content (plain or inside a code fence).

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;

use super::{LlmClient, LlmResponse, ToolSpec};

/// A type the model can be asked to fill in.
pub trait StructuredOutput: DeserializeOwned + Send {
    /// Tool name shown to the model.
    const NAME: &'static str;
    /// Tool description shown to the model.
    const DESCRIPTION: &'static str;

    /// JSON schema of the arguments.
    fn json_schema() -> Value;

    fn tool_spec() -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: Some(Self::DESCRIPTION.to_string()),
            input_schema: Self::json_schema(),
        }
    }
}

/// Extracts the first balanced `{...}` object from free text.
fn json_object_in(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reads `T` from a model response.
pub fn parse_structured<T: StructuredOutput>(response: &LlmResponse) -> Result<T, AgentError> {
    let call = response
        .tool_calls
        .iter()
        .find(|tc| tc.name == T::NAME)
        .or_else(|| response.tool_calls.first());
    if let Some(call) = call {
        return serde_json::from_str(&call.arguments).map_err(|e| {
            AgentError::ExecutionFailed(format!(
                "invalid {} arguments {:?}: {}",
                T::NAME,
                call.arguments,
                e
            ))
        });
    }
    let json = json_object_in(&response.content).ok_or_else(|| {
        AgentError::ExecutionFailed(format!(
            "model returned no {} tool call and no JSON object: {:?}",
            T::NAME,
            response.content
        ))
    })?;
    serde_json::from_str(json).map_err(|e| {
        AgentError::ExecutionFailed(format!("invalid {} JSON {:?}: {}", T::NAME, json, e))
    })
}

/// Invokes `llm` and parses the reply as `T`.
pub async fn invoke_structured<T: StructuredOutput>(
    llm: &dyn LlmClient,
    messages: &[Message],
) -> Result<T, AgentError> {
    let response = llm.invoke(messages).await?;
    let parsed = parse_structured::<T>(&response);
    if parsed.is_err() {
        tracing::debug!(schema = T::NAME, content = %response.content, "structured output parse failed");
    }
    parsed
}
