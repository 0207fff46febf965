//! OpenAI Embeddings implementation of [`Embedder`].
//!
//! Works with any OpenAI-compatible endpoint. Large inputs are sent in batches
//! of [`MAX_BATCH`] texts per request.

use async_openai::{
    config::OpenAIConfig,
    types::embeddings::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use super::{Embedder, StoreError};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const MAX_BATCH: usize = 256;

/// OpenAI embeddings client.
///
/// ```rust,no_run
/// use async_openai::config::OpenAIConfig;
/// use ragbot::vectorstore::OpenAIEmbedder;
///
/// let config = OpenAIConfig::new().with_api_key("sk-...");
/// let embedder = OpenAIEmbedder::with_config(config, "text-embedding-3-small");
/// ```
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Embedder with default config (API key from `OPENAI_API_KEY`).
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new(), model)
    }

    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimensions = Self::model_dimensions(&model);
        Self {
            client: Client::with_config(config),
            model,
            dimensions,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `text-embedding-3-large` is 3072; small, ada-002 and unknown models are 1536.
    fn model_dimensions(model: &str) -> usize {
        match model {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StoreError> {
        let input = match texts {
            [one] => EmbeddingInput::String(one.to_string()),
            many => EmbeddingInput::StringArray(many.iter().map(|s| s.to_string()).collect()),
        };
        let request = CreateEmbeddingRequest {
            input,
            model: self.model.clone(),
            ..Default::default()
        };
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| StoreError::EmbeddingError(format!("OpenAI API error: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StoreError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            debug!(model = %self.model, count = batch.len(), "embedding batch");
            let out = self.embed_batch(batch).await?;
            if out.len() != batch.len() {
                return Err(StoreError::EmbeddingError(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    out.len()
                )));
            }
            vectors.extend(out);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }
}
