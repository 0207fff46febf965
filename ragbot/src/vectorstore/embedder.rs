//! Embedder trait: turns text into vectors for the vector stores.

use async_trait::async_trait;

use super::StoreError;

/// Produces embedding vectors from text.
///
/// Implementations wrap OpenAI or, in tests, a deterministic mock.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in order.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StoreError>;

    /// Length of every vector returned by [`embed`](Embedder::embed).
    fn dimension(&self) -> usize;
}
