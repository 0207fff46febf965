//! LLM-backed chains: question router, graders and answer generation.
//!
//! Each chain holds an optional `Arc<dyn LlmClient>`. Without one it is in
//! offline mode and returns a fixed value, so the workflow still runs end to end.

mod answer_grader;
mod generation;
mod hallucination_grader;
mod retrieval_grader;
mod router;
mod score;

pub use answer_grader::{AnswerGrader, GradeAnswer};
pub use generation::{offline_generation, GenerationChain};
pub use hallucination_grader::{GradeHallucination, HallucinationGrader};
pub use retrieval_grader::{GradeDocuments, RetrievalGrader};
pub use router::{Datasource, QuestionRouter, RouteQuery};
pub use score::BinaryScore;

use std::collections::HashMap;

use crate::error::AgentError;
use crate::message::Message;
use crate::prompts::ChatPromptTemplate;

/// Renders `prompt` with `vars`, mapping template errors to `AgentError`.
fn render_prompt<const N: usize>(
    prompt: &ChatPromptTemplate,
    vars: [(&'static str, String); N],
) -> Result<Vec<Message>, AgentError> {
    let vars: HashMap<&str, String> = vars.into_iter().collect();
    prompt
        .format_messages(&vars)
        .map_err(|e| AgentError::ExecutionFailed(format!("prompt: {}", e)))
}
