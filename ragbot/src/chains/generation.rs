//! Answer generation from retrieved context.

use std::sync::Arc;

use crate::document::{format_documents, Document};
use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::prompts::{ChatPromptTemplate, Role};

use super::render_prompt;

const SYSTEM: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.";

const HUMAN: &str = "Question: {question}\nContext: {context}\nAnswer:";

/// Canned answer returned when no LLM is configured.
pub fn offline_generation(question: &str) -> String {
    format!(
        "[OFFLINE MODE] Dummy answer.\nI received your question: '{}'.\n\
         Configure OPENAI_API_KEY to enable real answer generation.",
        question
    )
}

pub struct GenerationChain {
    llm: Option<Arc<dyn LlmClient>>,
    prompt: ChatPromptTemplate,
}

impl GenerationChain {
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

    /// Generates an answer; documents are joined into the context with blank lines.
    pub async fn generate(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<String, AgentError> {
        let Some(llm) = &self.llm else {
            return Ok(offline_generation(question));
        };
        let messages = render_prompt(
            &self.prompt,
            [
                ("question", question.to_string()),
                ("context", format_documents(documents)),
            ],
        )?;
        let response = llm.invoke(&messages).await?;
        Ok(response.content.trim().to_string())
    }
}
