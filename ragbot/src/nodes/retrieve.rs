use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::GraphState;
use crate::vectorstore::Retriever;

use super::RETRIEVE;

/// Queries the vector index. Without a retriever (offline or no index) it
/// returns no documents.
pub struct RetrieveNode {
    retriever: Option<Arc<Retriever>>,
}

impl RetrieveNode {
    pub fn new(retriever: Option<Arc<Retriever>>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Node<GraphState> for RetrieveNode {
    fn id(&self) -> &str {
        RETRIEVE
    }

    async fn run(&self, state: GraphState) -> Result<(GraphState, Next), AgentError> {
        let Some(retriever) = &self.retriever else {
            let update = GraphState {
                documents: Some(Vec::new()),
                from_vector: Some(false),
                trace: Some(state.trace_with([
                    "Retriever not initialized. No documents found (offline / no index).",
                ])),
                ..GraphState::update()
            };
            return Ok((update, Next::Continue));
        };

        let mut trace = state.trace_with(["Retrieving relevant documents from vector store"]);
        let update = match retriever.retrieve(&state.question).await {
            Ok(documents) => {
                debug!(count = documents.len(), "retrieved");
                GraphState {
                    documents: Some(documents),
                    from_vector: Some(true),
                    trace: Some(trace),
                    ..GraphState::update()
                }
            }
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                trace.push(format!("Error retrieving documents: {}", e));
                GraphState {
                    documents: Some(Vec::new()),
                    from_vector: Some(false),
                    trace: Some(trace),
                    ..GraphState::update()
                }
            }
        };
        Ok((update, Next::Continue))
    }
}
