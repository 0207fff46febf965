//! Checks the generated answer: grounded in the documents, then on topic.
//!
//! The verdict is stored in `GraphState::grade` for the post-grading router.
//! Grader failures count as a pass. Once `max_generations` answers have been
//! produced, any verdict is accepted so the regenerate loop terminates.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::chains::{AnswerGrader, HallucinationGrader};
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::settings::DEFAULT_MAX_GENERATIONS;
use crate::state::{GenerationGrade, GraphState};

use super::GRADE_GENERATION;

pub struct GradeGenerationNode {
    hallucination: Arc<HallucinationGrader>,
    answer: Arc<AnswerGrader>,
    max_generations: u32,
}

impl GradeGenerationNode {
    pub fn new(hallucination: Arc<HallucinationGrader>, answer: Arc<AnswerGrader>) -> Self {
        Self {
            hallucination,
            answer,
            max_generations: DEFAULT_MAX_GENERATIONS,
        }
    }

    pub fn with_max_generations(mut self, max_generations: u32) -> Self {
        self.max_generations = max_generations;
        self
    }

    async fn verdict(&self, state: &GraphState, trace: &mut Vec<String>) -> GenerationGrade {
        let grounded = match self
            .hallucination
            .grade(state.documents(), state.generation())
            .await
        {
            Ok(g) => g.binary_score.is_yes(),
            Err(e) => {
                warn!(error = %e, "hallucination grader failed; treating answer as grounded");
                true
            }
        };
        if !grounded {
            trace.push("Check: not grounded → regenerate".into());
            return GenerationGrade::NotSupported;
        }
        trace.push("Check: grounded in documents ✔".into());

        let addresses = match self.answer.grade(&state.question, state.generation()).await {
            Ok(g) => g.binary_score.is_yes(),
            Err(e) => {
                warn!(error = %e, "answer grader failed; accepting answer");
                true
            }
        };
        if addresses {
            trace.push("Check: answer accepted ✔".into());
            GenerationGrade::Useful
        } else {
            trace.push("Check: answer does not address question → web search".into());
            GenerationGrade::NotUseful
        }
    }
}

#[async_trait]
impl Node<GraphState> for GradeGenerationNode {
    fn id(&self) -> &str {
        GRADE_GENERATION
    }

    async fn run(&self, state: GraphState) -> Result<(GraphState, Next), AgentError> {
        let mut trace = state.trace().to_vec();
        let mut grade = self.verdict(&state, &mut trace).await;
        if grade != GenerationGrade::Useful && state.generation_attempts() >= self.max_generations {
            trace.push("Check: retry budget exhausted → answer accepted".into());
            grade = GenerationGrade::Useful;
        }
        debug!(grade = grade.as_route(), "graded generation");
        let update = GraphState {
            grade: Some(grade),
            trace: Some(trace),
            ..GraphState::update()
        };
        Ok((update, Next::Continue))
    }
}
