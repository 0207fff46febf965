//! Routes a question to the vector store or to web search.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::llm::{invoke_structured, LlmClient, StructuredOutput};
use crate::prompts::{ChatPromptTemplate, Role};

use super::render_prompt;

const SYSTEM: &str = "You are an expert at routing a user question to a vectorstore or web search.\n\
The vectorstore contains documents related to agents, prompt engineering, and adversarial attacks.\n\
Use the vectorstore for questions on those topics. For all other questions, use websearch.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datasource {
    Vectorstore,
    Websearch,
}

impl Datasource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Datasource::Vectorstore => "vectorstore",
            Datasource::Websearch => "websearch",
        }
    }
}

/// Route decision for a user question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub datasource: Datasource,
}

impl StructuredOutput for RouteQuery {
    const NAME: &'static str = "RouteQuery";
    const DESCRIPTION: &'static str = "Route a user query to the most relevant datasource.";

    fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "datasource": {
                    "type": "string",
                    "enum": ["vectorstore", "websearch"],
                    "description": "Route decision for the user query"
                }
            },
            "required": ["datasource"]
        })
    }
}

pub struct QuestionRouter {
    llm: Option<Arc<dyn LlmClient>>,
    prompt: ChatPromptTemplate,
}

impl QuestionRouter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_llm(Some(llm))
    }

    /// Always routes to the vector store.
    pub fn offline() -> Self {
        Self::with_llm(None)
    }

    fn with_llm(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            llm,
            prompt: ChatPromptTemplate::from_messages([
                (Role::System, SYSTEM),
                (Role::User, "{question}"),
            ]),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.llm.is_none()
    }

    pub async fn route(&self, question: &str) -> Result<RouteQuery, AgentError> {
        let Some(llm) = &self.llm else {
            return Ok(RouteQuery {
                datasource: Datasource::Vectorstore,
            });
        };
        let messages = render_prompt(&self.prompt, [("question", question.to_string())])?;
        invoke_structured::<RouteQuery>(llm.as_ref(), &messages).await
    }
}
