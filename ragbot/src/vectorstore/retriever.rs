//! Retriever: a vector store plus a fixed number of results.

use std::sync::Arc;

use crate::document::Document;

use super::{StoreError, VectorStore};

pub const DEFAULT_TOP_K: usize = 4;

#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    k: usize,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            k: DEFAULT_TOP_K,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Top-k documents for `query`, most similar first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>, StoreError> {
        let hits = self.store.similarity_search(query, self.k).await?;
        tracing::debug!(k = self.k, hits = hits.len(), "retrieved documents");
        Ok(hits.into_iter().map(|h| h.document).collect())
    }
}
