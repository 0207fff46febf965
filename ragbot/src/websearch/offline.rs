use async_trait::async_trait;

use super::{SearchResult, WebSearch, WebSearchError};

/// Simulated search: one canned result that echoes the query.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineWebSearch;

#[async_trait]
impl WebSearch for OfflineWebSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, WebSearchError> {
        Ok(vec![SearchResult {
            title: "offline".to_string(),
            url: String::new(),
            content: format!(
                "[OFFLINE MODE] Web search is disabled.\nSimulated web result for question: '{}'.",
                query
            ),
        }])
    }

    fn is_online(&self) -> bool {
        false
    }
}
