//! Vector index for retrieval: embedders, stores and the retriever.
//!
//! [`SqliteVecStore`] is the persistent index (one SQLite file, KNN via sqlite-vec);
//! [`InMemoryVectorStore`] keeps everything in a `DashMap` and is used by tests.
//! Both embed document text through an [`Embedder`].

mod embedder;
mod in_memory;
mod openai_embedder;
mod retriever;
mod sqlite_vec;

pub use embedder::Embedder;
pub use in_memory::InMemoryVectorStore;
pub use openai_embedder::{OpenAIEmbedder, DEFAULT_EMBEDDING_MODEL};
pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use sqlite_vec::{SqliteVecStore, DB_FILE_NAME};

use async_trait::async_trait;

use crate::document::Document;

/// Error for store and embedding operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("serialization: {0}")]
    Serialization(String),

    /// Backend storage error (DB I/O, schema). Message only, no backend types.
    #[error("storage: {0}")]
    Storage(String),

    /// Embedding generation error (e.g. OpenAI API error).
    #[error("embedding: {0}")]
    EmbeddingError(String),

    /// The collection was created for embeddings of another size.
    #[error(
        "collection {collection} stores {stored}-dimensional vectors but the embedder produces \
         {expected}; rebuild the index or change the collection name"
    )]
    DimensionMismatch {
        collection: String,
        stored: usize,
        expected: usize,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// A search hit. Higher `score` is more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// A collection of embedded documents searchable by text query.
///
/// **Interaction**: Held as `Arc<dyn VectorStore>` by [`Retriever`] and the ingestor.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embeds and stores `documents`. Returns how many were added.
    async fn add_documents(&self, documents: &[Document]) -> Result<usize, StoreError>;

    /// Returns up to `k` documents ordered by decreasing similarity to `query`.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Removes every document from the collection.
    async fn reset(&self) -> Result<(), StoreError>;
}

/// Checks that the embedder returned one vector of the right size per input.
pub(crate) fn check_vectors(
    vectors: &[Vec<f32>],
    expected_count: usize,
    dimension: usize,
) -> Result<(), StoreError> {
    if vectors.len() != expected_count {
        return Err(StoreError::EmbeddingError(format!(
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            expected_count
        )));
    }
    if let Some(v) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(StoreError::Storage(format!(
            "embedder dimension {} != expected {}",
            v.len(),
            dimension
        )));
    }
    Ok(())
}
