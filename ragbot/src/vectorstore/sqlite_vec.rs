//! Persistent vector store on SQLite with the sqlite-vec extension.
//!
//! One database file (`ragbot.sqlite3`) lives under the persist directory. Each
//! collection gets two tables: `docs_<suffix>` holds content and metadata JSON,
//! `vec_<suffix>` is a `vec0` virtual table keyed by the same rowid. Search embeds
//! the query and runs a KNN match; score is `1 / (1 + distance)`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::document::Document;

use super::{check_vectors, Embedder, ScoredDocument, StoreError, VectorStore};

pub const DB_FILE_NAME: &str = "ragbot.sqlite3";

static SQLITE_VEC_INIT: Once = Once::new();

fn register_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

fn storage_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Storage(e.to_string())
}

/// Formats a vector as JSON for sqlite-vec (e.g. "[0.1,0.2]").
fn vector_to_json(v: &[f32]) -> String {
    let parts: Vec<String> = v.iter().map(|f| f.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Lowercase ASCII alphanumerics (everything else becomes `_`) plus the first
/// eight hex digits of the name's SHA-256, so `a-b` and `a_b` do not share tables.
fn table_suffix(collection: &str) -> String {
    let readable: String = collection
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let readable = if readable.is_empty() {
        "default"
    } else {
        readable.as_str()
    };
    let mut hasher = Sha256::new();
    hasher.update(collection.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}_{}", readable, &digest[..8])
}

/// Size of `embedding float[N]` in an existing vec0 table, `None` if the table is new.
fn stored_dimension(
    conn: &rusqlite::Connection,
    vec_table: &str,
) -> Result<Option<usize>, StoreError> {
    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE name = ?1",
            params![vec_table],
            |row| row.get(0),
        )
        .optional()
        .map_err(storage_err)?;
    let Some(sql) = sql else {
        return Ok(None);
    };
    let dimension = sql
        .split_once("float[")
        .and_then(|(_, rest)| rest.split_once(']'))
        .and_then(|(n, _)| n.trim().parse().ok())
        .ok_or_else(|| StoreError::Storage(format!("unexpected schema for {}: {}", vec_table, sql)))?;
    Ok(Some(dimension))
}

/// SQLite + sqlite-vec collection.
///
/// **Interaction**: Built by the ingestor and the workflow from `RagSettings`;
/// used as `Arc<dyn VectorStore>` behind a [`Retriever`](super::Retriever).
pub struct SqliteVecStore {
    db_path: PathBuf,
    embedder: Arc<dyn Embedder>,
    dimension: usize,
    docs_table: String,
    vec_table: String,
}

impl SqliteVecStore {
    /// Opens (creating if needed) `collection` under `persist_dir`.
    pub fn open(
        persist_dir: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, StoreError> {
        register_sqlite_vec();

        let persist_dir = persist_dir.as_ref();
        std::fs::create_dir_all(persist_dir).map_err(storage_err)?;
        let db_path = persist_dir.join(DB_FILE_NAME);
        let dimension = embedder.dimension();
        let suffix = table_suffix(collection);
        let docs_table = format!("docs_{}", suffix);
        let vec_table = format!("vec_{}", suffix);

        let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
        if let Some(stored) = stored_dimension(&conn, &vec_table)? {
            if stored != dimension {
                return Err(StoreError::DimensionMismatch {
                    collection: collection.to_string(),
                    stored,
                    expected: dimension,
                });
            }
        }
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (
                    id INTEGER PRIMARY KEY,
                    content TEXT NOT NULL,
                    metadata TEXT NOT NULL
                )",
                docs_table
            ),
            [],
        )
        .map_err(storage_err)?;
        conn.execute(
            &format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS \"{}\" USING vec0(embedding float[{}])",
                vec_table, dimension
            ),
            [],
        )
        .map_err(storage_err)?;

        Ok(Self {
            db_path,
            embedder,
            dimension,
            docs_table,
            vec_table,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl VectorStore for SqliteVecStore {
    async fn add_documents(&self, documents: &[Document]) -> Result<usize, StoreError> {
        if documents.is_empty() {
            return Ok(0);
        }
        let texts: Vec<&str> = documents.iter().map(|d| d.page_content.as_str()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        check_vectors(&vectors, documents.len(), self.dimension)?;

        let mut rows = Vec::with_capacity(documents.len());
        for (doc, vector) in documents.iter().zip(vectors.iter()) {
            rows.push((
                doc.page_content.clone(),
                serde_json::to_string(&doc.metadata)?,
                vector_to_json(vector),
            ));
        }
        let db_path = self.db_path.clone();
        let docs_table = self.docs_table.clone();
        let vec_table = self.vec_table.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            let tx = conn.transaction().map_err(storage_err)?;
            for (content, metadata, vec_json) in &rows {
                tx.execute(
                    &format!(
                        "INSERT INTO \"{}\" (content, metadata) VALUES (?1, ?2)",
                        docs_table
                    ),
                    params![content, metadata],
                )
                .map_err(storage_err)?;
                let id = tx.last_insert_rowid();
                tx.execute(
                    &format!(
                        "INSERT INTO \"{}\" (rowid, embedding) VALUES (?1, ?2)",
                        vec_table
                    ),
                    params![id, vec_json],
                )
                .map_err(storage_err)?;
            }
            tx.commit().map_err(storage_err)?;
            Ok::<usize, StoreError>(rows.len())
        })
        .await
        .map_err(storage_err)?
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self
            .embedder
            .embed(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::EmbeddingError("No vector returned".into()))?;
        check_vectors(std::slice::from_ref(&query_vec), 1, self.dimension)?;
        let vec_json = vector_to_json(&query_vec);
        let db_path = self.db_path.clone();
        let docs_table = self.docs_table.clone();
        let vec_table = self.vec_table.clone();

        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT rowid, distance FROM \"{}\" WHERE embedding MATCH ?1 AND k = ?2 ORDER BY distance",
                    vec_table
                ))
                .map_err(storage_err)?;
            let nearest: Vec<(i64, f64)> = stmt
                .query_map(params![vec_json, k as i64], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
                })
                .map_err(storage_err)?
                .collect::<Result<_, _>>()
                .map_err(storage_err)?;
            if nearest.is_empty() {
                return Ok::<_, StoreError>(Vec::new());
            }

            let placeholders = vec!["?"; nearest.len()].join(",");
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT id, content, metadata FROM \"{}\" WHERE id IN ({})",
                    docs_table, placeholders
                ))
                .map_err(storage_err)?;
            let mut by_id: HashMap<i64, (String, String)> = stmt
                .query_map(
                    rusqlite::params_from_iter(nearest.iter().map(|(id, _)| *id)),
                    |row| Ok((row.get::<_, i64>(0)?, (row.get(1)?, row.get(2)?))),
                )
                .map_err(storage_err)?
                .collect::<Result<_, _>>()
                .map_err(storage_err)?;

            let mut hits = Vec::with_capacity(nearest.len());
            for (id, distance) in nearest {
                let Some((content, metadata)) = by_id.remove(&id) else {
                    continue;
                };
                hits.push(ScoredDocument {
                    document: Document {
                        page_content: content,
                        metadata: serde_json::from_str(&metadata)?,
                    },
                    score: (1.0 / (1.0 + distance)) as f32,
                });
            }
            Ok(hits)
        })
        .await
        .map_err(storage_err)?
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let db_path = self.db_path.clone();
        let docs_table = self.docs_table.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            let n: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", docs_table), [], |row| {
                    row.get(0)
                })
                .map_err(storage_err)?;
            Ok::<usize, StoreError>(n as usize)
        })
        .await
        .map_err(storage_err)?
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let db_path = self.db_path.clone();
        let docs_table = self.docs_table.clone();
        let vec_table = self.vec_table.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = rusqlite::Connection::open(&db_path).map_err(storage_err)?;
            let tx = conn.transaction().map_err(storage_err)?;
            tx.execute(&format!("DELETE FROM \"{}\"", vec_table), [])
                .map_err(storage_err)?;
            tx.execute(&format!("DELETE FROM \"{}\"", docs_table), [])
                .map_err(storage_err)?;
            tx.commit().map_err(storage_err)
        })
        .await
        .map_err(storage_err)?
    }
}
