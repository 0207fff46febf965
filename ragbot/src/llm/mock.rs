//! Mock LLM for tests: replays scripted replies in order.
//!
//! Once the script runs out the last reply repeats, so a single-reply mock can
//! serve any number of calls. Every call's messages are recorded for assertions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;

use super::{LlmClient, LlmResponse, ToolCall};

/// One scripted reply.
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Plain assistant text.
    Content(String),
    /// A single tool call with JSON arguments.
    ToolCall { name: String, arguments: String },
    /// The call fails with `AgentError::ExecutionFailed`.
    Error(String),
}

impl MockReply {
    fn to_response(&self) -> Result<LlmResponse, AgentError> {
        match self {
            MockReply::Content(c) => Ok(LlmResponse::text(c.clone())),
            MockReply::ToolCall { name, arguments } => Ok(LlmResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    name: name.clone(),
                    arguments: arguments.clone(),
                    id: Some("call-1".to_string()),
                }],
                usage: None,
            }),
            MockReply::Error(e) => Err(AgentError::ExecutionFailed(e.clone())),
        }
    }
}

/// Scripted `LlmClient`.
pub struct MockLlm {
    script: Mutex<VecDeque<MockReply>>,
    last: Mutex<MockReply>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Replies are returned in order; the last one repeats. An empty script yields empty text.
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let script: VecDeque<MockReply> = replies.into_iter().collect();
        let last = script
            .back()
            .cloned()
            .unwrap_or_else(|| MockReply::Content(String::new()));
        Self {
            script: Mutex::new(script),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `content`.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self::scripted([MockReply::Content(content.into())])
    }

    /// Always answers with one tool call carrying `arguments` (a JSON value).
    pub fn with_tool_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::scripted([MockReply::ToolCall {
            name: name.into(),
            arguments: arguments.to_string(),
        }])
    }

    /// Always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::scripted([MockReply::Error(message.into())])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages of every call so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages.to_vec());
        }
        let poisoned = || AgentError::ExecutionFailed("mock llm lock poisoned".to_string());
        let next = self.script.lock().map_err(|_| poisoned())?.pop_front();
        let reply = match next {
            Some(reply) => {
                *self.last.lock().map_err(|_| poisoned())? = reply.clone();
                reply
            }
            None => self.last.lock().map_err(|_| poisoned())?.clone(),
        };
        reply.to_response()
    }
}
