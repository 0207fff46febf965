use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::document::Document;
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::GraphState;
use crate::websearch::WebSearch;

use super::WEB_SEARCH;

/// Appends one document holding the web results (contents joined by newlines).
pub struct WebSearchNode {
    search: Arc<dyn WebSearch>,
}

impl WebSearchNode {
    pub fn new(search: Arc<dyn WebSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Node<GraphState> for WebSearchNode {
    fn id(&self) -> &str {
        WEB_SEARCH
    }

    async fn run(&self, state: GraphState) -> Result<(GraphState, Next), AgentError> {
        let mut documents = state.documents().to_vec();
        let mut trace = state.trace().to_vec();

        match self.search.search(&state.question).await {
            Ok(results) => {
                let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
                documents.push(Document::new(contents.join("\n")));
                trace.push(if self.search.is_online() {
                    "Web search executed (online)".into()
                } else {
                    "Web search simulated (offline)".into()
                });
            }
            Err(e) => {
                warn!(error = %e, "web search failed");
                trace.push(format!("Web search error: {}", e));
            }
        }

        let update = GraphState {
            documents: Some(documents),
            trace: Some(trace),
            from_vector: Some(false),
            ..GraphState::update()
        };
        Ok((update, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websearch::{OfflineWebSearch, SearchResult, WebSearchError};

    struct StubSearch(Result<Vec<&'static str>, u16>);

    #[async_trait]
    impl WebSearch for StubSearch {
        async fn search(&self, _: &str) -> Result<Vec<SearchResult>, WebSearchError> {
            match &self.0 {
                Ok(contents) => Ok(contents
                    .iter()
                    .map(|c| SearchResult {
                        title: String::new(),
                        url: String::new(),
                        content: c.to_string(),
                    })
                    .collect()),
                Err(status) => Err(WebSearchError::Api {
                    status: *status,
                    body: "quota".into(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn offline_appends_simulated_document() {
        let state = GraphState {
            documents: Some(vec![Document::new("kept")]),
            from_vector: Some(true),
            ..GraphState::new("Who won?")
        };
        let (update, _) = WebSearchNode::new(Arc::new(OfflineWebSearch))
            .run(state)
            .await
            .unwrap();
        let docs = update.documents();
        assert_eq!(docs.len(), 2);
        assert_eq!(
            docs[1].page_content,
            "[OFFLINE MODE] Web search is disabled.\nSimulated web result for question: 'Who won?'."
        );
        assert_eq!(update.from_vector, Some(false));
        assert_eq!(update.trace(), ["Web search simulated (offline)"]);
    }

    /// **Scenario**: Online results collapse into one document with contents joined by newlines.
    #[tokio::test]
    async fn online_joins_results() {
        let node = WebSearchNode::new(Arc::new(StubSearch(Ok(vec!["one", "two", "three"]))));
        let (update, _) = node.run(GraphState::new("q")).await.unwrap();
        assert_eq!(update.documents(), &[Document::new("one\ntwo\nthree")]);
        assert_eq!(update.trace(), ["Web search executed (online)"]);
    }

    #[tokio::test]
    async fn error_keeps_documents() {
        let state = GraphState {
            documents: Some(vec![Document::new("kept")]),
            ..GraphState::new("q")
        };
        let node = WebSearchNode::new(Arc::new(StubSearch(Err(429))));
        let (update, _) = node.run(state).await.unwrap();
        assert_eq!(update.documents(), &[Document::new("kept")]);
        assert_eq!(update.from_vector, Some(false));
        assert_eq!(update.trace(), ["Web search error: API error 429: quota"]);
    }
}
