//! In-memory vector store. Not persistent; used by tests and offline demos.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::document::Document;

use super::{check_vectors, Embedder, ScoredDocument, StoreError, VectorStore};

struct Entry {
    vector: Vec<f32>,
    document: Document,
}

/// Vector store backed by a `DashMap`, ranked by cosine similarity.
///
/// Ties keep insertion order.
pub struct InMemoryVectorStore {
    data: DashMap<u64, Entry>,
    next_id: AtomicU64,
    embedder: Arc<dyn Embedder>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            data: DashMap::new(),
            next_id: AtomicU64::new(0),
            embedder,
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add_documents(&self, documents: &[Document]) -> Result<usize, StoreError> {
        if documents.is_empty() {
            return Ok(0);
        }
        let texts: Vec<&str> = documents.iter().map(|d| d.page_content.as_str()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        check_vectors(&vectors, documents.len(), self.embedder.dimension())?;
        for (document, vector) in documents.iter().zip(vectors) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.data.insert(
                id,
                Entry {
                    vector,
                    document: document.clone(),
                },
            );
        }
        Ok(documents.len())
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, StoreError> {
        if k == 0 || self.data.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self
            .embedder
            .embed(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::EmbeddingError("No vector returned".into()))?;

        let mut hits: Vec<(u64, ScoredDocument)> = self
            .data
            .iter()
            .map(|e| {
                (
                    *e.key(),
                    ScoredDocument {
                        document: e.value().document.clone(),
                        score: Self::cosine_similarity(&query_vec, &e.value().vector),
                    },
                )
            })
            .collect();
        hits.sort_by(|(ia, a), (ib, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        });
        Ok(hits.into_iter().take(k).map(|(_, hit)| hit).collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.data.len())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.data.clear();
        Ok(())
    }
}
