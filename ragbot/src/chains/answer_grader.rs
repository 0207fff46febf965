//! Checks that an answer actually addresses the question.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::llm::{invoke_structured, LlmClient, StructuredOutput};
use crate::prompts::{ChatPromptTemplate, Role};

use super::score::binary_score_schema;
use super::{render_prompt, BinaryScore};

const SYSTEM: &str =
    "You are a grader assessing whether an answer addresses a question. Answer strictly with yes or no.";

const HUMAN: &str = "Question:\n{question}\n\nAnswer:\n{generation}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeAnswer {
    pub binary_score: BinaryScore,
}

impl StructuredOutput for GradeAnswer {
    const NAME: &'static str = "GradeAnswer";
    const DESCRIPTION: &'static str = "Binary score to assess whether the answer addresses the question.";

    fn json_schema() -> serde_json::Value {
        binary_score_schema("Whether the answer sufficiently addresses the question")
    }
}

pub struct AnswerGrader {
    llm: Option<Arc<dyn LlmClient>>,
    prompt: ChatPromptTemplate,
}

impl AnswerGrader {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_llm(Some(llm))
    }

    pub fn offline() -> Self {
        Self::with_llm(None)
    }

    fn with_llm(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            llm,
            prompt: ChatPromptTemplate::from_messages([(Role::System, SYSTEM), (Role::User, HUMAN)]),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.llm.is_none()
    }

    pub async fn grade(&self, question: &str, generation: &str) -> Result<GradeAnswer, AgentError> {
        let Some(llm) = &self.llm else {
            return Ok(GradeAnswer {
                binary_score: BinaryScore::yes(),
            });
        };
        let messages = render_prompt(
            &self.prompt,
            [
                ("question", question.to_string()),
                ("generation", generation.to_string()),
            ],
        )?;
        invoke_structured::<GradeAnswer>(llm.as_ref(), &messages).await
    }
}
