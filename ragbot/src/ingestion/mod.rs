//! Builds the vector index from local files and web pages.
//!
//! [`Ingestor::build_index`] loads, splits, embeds and stores documents in the
//! persistent [`SqliteVecStore`]. In offline mode (no embedder) it does nothing.

pub mod loader;
mod splitter;

pub use splitter::{
    LengthFunction, RecursiveCharacterTextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_SEPARATORS,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::settings::RagSettings;
use crate::vectorstore::{Embedder, OpenAIEmbedder, SqliteVecStore, StoreError, VectorStore};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid path pattern {0}")]
    Pattern(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to extract PDF text from {path}: {message}")]
    Pdf { path: String, message: String },

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("splitter: {0}")]
    Splitter(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("ingestion task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Indexed,
    /// No OpenAI key: indexing disabled.
    SkippedOffline,
    NoDocuments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub status: IndexStatus,
    pub local_documents: usize,
    pub web_documents: usize,
    pub chunks: usize,
    pub collection: String,
}

impl IndexReport {
    fn empty(status: IndexStatus, collection: &str) -> Self {
        Self {
            status,
            local_documents: 0,
            web_documents: 0,
            chunks: 0,
            collection: collection.to_string(),
        }
    }
}

pub struct Ingestor {
    embedder: Option<Arc<dyn Embedder>>,
    persist_dir: PathBuf,
    collection: String,
    splitter: RecursiveCharacterTextSplitter,
    client: reqwest::Client,
}

impl Ingestor {
    pub fn new(
        embedder: Option<Arc<dyn Embedder>>,
        persist_dir: impl Into<PathBuf>,
        collection: impl Into<String>,
        splitter: RecursiveCharacterTextSplitter,
    ) -> Self {
        Self {
            embedder,
            persist_dir: persist_dir.into(),
            collection: collection.into(),
            splitter,
            client: reqwest::Client::new(),
        }
    }

    /// OpenAI embedder when a key is configured, 250-token chunks.
    pub fn from_settings(settings: &RagSettings) -> Result<Self, IngestError> {
        let embedder: Option<Arc<dyn Embedder>> = settings.openai_config().map(|config| {
            Arc::new(OpenAIEmbedder::with_config(config, &settings.embedding_model))
                as Arc<dyn Embedder>
        });
        let splitter =
            RecursiveCharacterTextSplitter::from_tiktoken(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)?;
        Ok(Self::new(
            embedder,
            &settings.persist_dir,
            &settings.collection,
            splitter,
        ))
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    /// Opens the collection this ingestor writes to.
    pub fn open_store(&self) -> Result<Option<SqliteVecStore>, IngestError> {
        match &self.embedder {
            None => Ok(None),
            Some(embedder) => Ok(Some(SqliteVecStore::open(
                &self.persist_dir,
                &self.collection,
                embedder.clone(),
            )?)),
        }
    }

    /// Loads `paths` (globs) and `urls`, then splits and indexes them.
    ///
    /// `rebuild` deletes the persist directory before writing.
    pub async fn build_index(
        &self,
        paths: &[String],
        urls: &[String],
        rebuild: bool,
    ) -> Result<IndexReport, IngestError> {
        if self.embedder.is_none() {
            warn!("OPENAI_API_KEY is not set; indexing is disabled in offline mode");
            return Ok(IndexReport::empty(IndexStatus::SkippedOffline, &self.collection));
        }

        let patterns = paths.to_vec();
        let local = tokio::task::spawn_blocking(move || loader::load_paths(&patterns))
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;
        let web = loader::load_urls(&self.client, urls).await;
        if local.is_empty() && web.is_empty() {
            warn!("no documents found to index; provide paths and/or urls");
            return Ok(IndexReport::empty(IndexStatus::NoDocuments, &self.collection));
        }
        info!(
            local = local.len(),
            web = web.len(),
            "loaded documents"
        );

        if rebuild && self.persist_dir.is_dir() {
            info!(dir = %self.persist_dir.display(), "rebuilding index: removing persist directory");
            let dir = self.persist_dir.clone();
            tokio::task::spawn_blocking(move || {
                std::fs::remove_dir_all(&dir).map_err(|e| IngestError::Io {
                    path: dir.display().to_string(),
                    source: e,
                })
            })
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;
        }

        let mut all = local.clone();
        all.extend(web.iter().cloned());
        let chunks = self.splitter.split_documents(&all);
        info!(chunks = chunks.len(), documents = all.len(), "split documents");

        let store = self
            .open_store()?
            .ok_or_else(|| IngestError::Task("embedder missing".into()))?;
        store.add_documents(&chunks).await?;
        info!(collection = %self.collection, chunks = chunks.len(), "indexed documents");

        Ok(IndexReport {
            status: IndexStatus::Indexed,
            local_documents: local.len(),
            web_documents: web.len(),
            chunks: chunks.len(),
            collection: self.collection.clone(),
        })
    }
}
