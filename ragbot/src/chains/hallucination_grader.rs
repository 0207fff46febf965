//! Checks that a generation is grounded in the retrieved facts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::{format_documents, Document};
use crate::error::AgentError;
use crate::llm::{invoke_structured, LlmClient, StructuredOutput};
use crate::prompts::{ChatPromptTemplate, Role};

use super::score::binary_score_schema;
use super::{render_prompt, BinaryScore};

const SYSTEM: &str = "You are a grader assessing whether an LLM generation is grounded in / supported by a set of facts.\n\
Give a binary score 'yes' or 'no'. 'yes' means the answer is grounded in / supported by the set of facts.";

const HUMAN: &str = "Set of facts:\n\n{documents}\n\nLLM generation:\n{generation}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeHallucination {
    pub binary_score: BinaryScore,
}

impl StructuredOutput for GradeHallucination {
    const NAME: &'static str = "GradeHallucination";
    const DESCRIPTION: &'static str = "Binary score for hallucination present in the generated answer.";

    fn json_schema() -> serde_json::Value {
        binary_score_schema("Whether the answer is grounded in the provided facts.")
    }
}

pub struct HallucinationGrader {
    llm: Option<Arc<dyn LlmClient>>,
    prompt: ChatPromptTemplate,
}

impl HallucinationGrader {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_llm(Some(llm))
    }

    /// Treats every generation as grounded.
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

    pub async fn grade(
        &self,
        documents: &[Document],
        generation: &str,
    ) -> Result<GradeHallucination, AgentError> {
        let Some(llm) = &self.llm else {
            return Ok(GradeHallucination {
                binary_score: BinaryScore::yes(),
            });
        };
        let messages = render_prompt(
            &self.prompt,
            [
                ("documents", format_documents(documents)),
                ("generation", generation.to_string()),
            ],
        )?;
        invoke_structured::<GradeHallucination>(llm.as_ref(), &messages).await
    }
}
