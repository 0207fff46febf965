//! Grades whether a retrieved document is relevant to the question.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::AgentError;
use crate::llm::{invoke_structured, LlmClient, StructuredOutput};
use crate::prompts::{ChatPromptTemplate, Role};

use super::score::binary_score_schema;
use super::{render_prompt, BinaryScore};

const SYSTEM: &str = "You are a grader assessing relevance of a retrieved document to a user question.\n\
If the document contains keywords or semantic meaning related to the question,\n\
grade it as relevant. Give a binary score 'yes' or 'no' to indicate whether\n\
the document is relevant to the question.";

const HUMAN: &str = "Retrieved document:\n\n{document}\n\nUser question:\n{question}";

/// Binary relevance score for one retrieved document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeDocuments {
    pub binary_score: BinaryScore,
}

impl StructuredOutput for GradeDocuments {
    const NAME: &'static str = "GradeDocuments";
    const DESCRIPTION: &'static str = "Binary score for relevance check on retrieved documents.";

    fn json_schema() -> serde_json::Value {
        binary_score_schema("Documents are relevant to the question, 'yes' or 'no'")
    }
}

pub struct RetrievalGrader {
    llm: Option<Arc<dyn LlmClient>>,
    prompt: ChatPromptTemplate,
}

impl RetrievalGrader {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_llm(Some(llm))
    }

    /// Grades every document as relevant.
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
        question: &str,
        document: &Document,
    ) -> Result<GradeDocuments, AgentError> {
        let Some(llm) = &self.llm else {
            return Ok(GradeDocuments {
                binary_score: BinaryScore::yes(),
            });
        };
        let messages = render_prompt(
            &self.prompt,
            [
                ("document", document.page_content.clone()),
                ("question", question.to_string()),
            ],
        )?;
        invoke_structured::<GradeDocuments>(llm.as_ref(), &messages).await
    }
}
