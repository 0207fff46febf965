use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::chains::GenerationChain;
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::GraphState;

use super::GENERATE;

pub const GENERATION_FAILED: &str = "[ERROR] Generation failed in offline mode.";

/// Generates the answer from the question and current documents; counts attempts.
pub struct GenerateNode {
    chain: Arc<GenerationChain>,
}

impl GenerateNode {
    pub fn new(chain: Arc<GenerationChain>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl Node<GraphState> for GenerateNode {
    fn id(&self) -> &str {
        GENERATE
    }

    async fn run(&self, state: GraphState) -> Result<(GraphState, Next), AgentError> {
        let mut trace = state.trace().to_vec();
        let generation = match self.chain.generate(&state.question, state.documents()).await {
            Ok(answer) => {
                trace.push("Generated answer".into());
                answer
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                trace.push(format!("Generation error: {}", e));
                GENERATION_FAILED.to_string()
            }
        };
        let update = GraphState {
            generation: Some(generation),
            trace: Some(trace),
            generation_attempts: Some(state.generation_attempts() + 1),
            ..GraphState::update()
        };
        Ok((update, Next::Continue))
    }
}
