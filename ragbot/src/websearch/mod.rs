//! Web search backends used when retrieval comes up short.

mod offline;
mod tavily;

pub use offline::OfflineWebSearch;
pub use tavily::{TavilySearch, TAVILY_API_BASE};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error from a web search backend.
#[derive(Debug, thiserror::Error)]
pub enum WebSearchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// **Interaction**: Held as `Arc<dyn WebSearch>` by the `web_search` node.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, WebSearchError>;

    /// `false` for simulated backends; the node uses it to label its trace entry.
    fn is_online(&self) -> bool {
        true
    }
}
