//! Tavily search API client.
//!
//! `POST {base}/search` with a Bearer key and `{query, max_results}`; the reply's
//! `results[]` carry `title`, `url` and `content`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SearchResult, WebSearch, WebSearchError};

pub const TAVILY_API_BASE: &str = "https://api.tavily.com";

const DEFAULT_MAX_RESULTS: usize = 3;

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

pub struct TavilySearch {
    api_key: Arc<str>,
    base_url: String,
    max_results: usize,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<Arc<str>>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: TAVILY_API_BASE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            client: reqwest::Client::new(),
        }
    }

    /// Overrides the API base URL (trailing slashes are dropped).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Custom reqwest client for timeouts or proxies.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, WebSearchError> {
        let url = format!("{}/search", self.base_url);
        debug!(%url, max_results = self.max_results, "tavily search");
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.as_ref())
            .json(&SearchRequest {
                query,
                max_results: self.max_results,
            })
            .send()
            .await
            .map_err(|e| WebSearchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebSearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| WebSearchError::InvalidResponse(e.to_string()))?;
        Ok(parsed.results)
    }
}
