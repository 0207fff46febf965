use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::chains::RetrievalGrader;
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::GraphState;

use super::GRADE_DOCUMENTS;

pub const DECISION_WEB_SEARCH: &str = "Decision: not all docs relevant → web search";
pub const DECISION_GENERATE: &str = "Decision: docs sufficient → generate";

/// Keeps the relevant documents and flags web search when any document is
/// irrelevant, fails to grade, or none were retrieved.
pub struct GradeDocumentsNode {
    grader: Arc<RetrievalGrader>,
}

impl GradeDocumentsNode {
    pub fn new(grader: Arc<RetrievalGrader>) -> Self {
        Self { grader }
    }
}

#[async_trait]
impl Node<GraphState> for GradeDocumentsNode {
    fn id(&self) -> &str {
        GRADE_DOCUMENTS
    }

    async fn run(&self, state: GraphState) -> Result<(GraphState, Next), AgentError> {
        let mut trace = state.trace().to_vec();
        let documents = state.documents();

        if documents.is_empty() {
            trace.push("No documents retrieved -> enable web search".into());
            trace.push(DECISION_WEB_SEARCH.into());
            let update = GraphState {
                documents: Some(Vec::new()),
                web_search: Some(true),
                trace: Some(trace),
                ..GraphState::update()
            };
            return Ok((update, Next::Continue));
        }

        let mut kept = Vec::with_capacity(documents.len());
        let mut web_search = false;
        for doc in documents {
            match self.grader.grade(&state.question, doc).await {
                Ok(grade) if grade.binary_score.is_yes() => {
                    debug!("document relevant");
                    trace.push("Grader: relevant doc kept".into());
                    kept.push(doc.clone());
                }
                Ok(_) => {
                    debug!("document not relevant");
                    trace.push("Grader: irrelevant doc -> enable web search".into());
                    web_search = true;
                }
                Err(e) => {
                    warn!(error = %e, "document grading failed");
                    trace.push("Grader error -> treat doc as irrelevant, enable web search".into());
                    web_search = true;
                }
            }
        }
        trace.push(
            if web_search {
                DECISION_WEB_SEARCH
            } else {
                DECISION_GENERATE
            }
            .into(),
        );

        let update = GraphState {
            documents: Some(kept),
            web_search: Some(web_search),
            trace: Some(trace),
            ..GraphState::update()
        };
        Ok((update, Next::Continue))
    }
}
