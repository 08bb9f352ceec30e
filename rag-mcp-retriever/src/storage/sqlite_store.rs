//! SQLite implementation of [`ChunkStore`].
//!
//! The database lives at `<root>/.muxue_rag/index.db`:
//!
//! ```sql
//! CREATE TABLE chunks (
//!     id TEXT PRIMARY KEY,
//!     file_path TEXT NOT NULL,
//!     file_name TEXT NOT NULL,
//!     mtime REAL NOT NULL,
//!     chunk_index INTEGER NOT NULL,
//!     total_chunks INTEGER NOT NULL,
//!     content TEXT NOT NULL,
//!     embedding BLOB NOT NULL      -- f16 values, little-endian
//! );
//! ```
//!
//! Queries are a linear scan over every stored embedding. Distances are squared L2
//! between the unit-normalized query and chunk vectors, `2 * (1 - cosine)`, so they
//! range over `0.0..=4.0`.

use super::{
    ChunkId, ChunkMetadata, ChunkStore, QueryHit, WRITE_BATCH_SIZE, has_index, index_dir,
};
use crate::error::{Result, RetrieverError};
use async_trait::async_trait;
use half::f16;
use rag_mcp_embed::{EmbedError, EmbeddingProvider};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DB_FILE_NAME: &str = "index.db";

/// Chunk store backed by a per-root SQLite database.
pub struct SqliteStore {
    root: PathBuf,
    /// `None` for in-memory stores, which have nothing to create on disk
    index_dir: Option<PathBuf>,
    pool: SqlitePool,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("root", &self.root)
            .field("index_dir", &self.index_dir)
            .field("embedder", &self.embedder.provider_name())
            .finish()
    }
}

impl SqliteStore {
    /// Open the index of `root`, creating the index folder and schema when missing.
    pub async fn open(root: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let dir = index_dir(root);
        tokio::fs::create_dir_all(&dir).await?;
        let pool = Self::connect(&dir, true).await?;
        let store = Self {
            root: root.to_path_buf(),
            index_dir: Some(dir),
            pool,
            embedder,
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Open the index of `root` for querying without ever creating one.
    pub async fn open_existing(root: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if !has_index(root) {
            return Err(RetrieverError::StorageUnavailable {
                root: root.to_path_buf(),
            });
        }
        let dir = index_dir(root);
        let pool = Self::connect(&dir, false).await?;
        let store = Self {
            root: root.to_path_buf(),
            index_dir: Some(dir),
            pool,
            embedder,
        };
        store.create_tables().await?;
        Ok(store)
    }

    /// Open a throwaway store held entirely in memory.
    pub async fn open_memory(root: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        // A single connection that never expires, otherwise each pooled connection
        // would see its own empty in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self {
            root: root.to_path_buf(),
            index_dir: None,
            pool,
            embedder,
        };
        store.initialize().await?;
        Ok(store)
    }

    async fn connect(dir: &Path, create: bool) -> Result<SqlitePool> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(dir.join(DB_FILE_NAME))
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .create_if_missing(create),
        )
        .await?;
        Ok(pool)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL,
                file_name TEXT NOT NULL,
                mtime REAL NOT NULL,
                chunk_index INTEGER NOT NULL,
                total_chunks INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_file_path ON chunks(file_path)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }


    /// Number of stored chunks.
    pub async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Text of every chunk belonging to `file_path`, in chunk order.
    pub async fn file_chunks(&self, file_path: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT content FROM chunks WHERE file_path = ?1 ORDER BY chunk_index",
        )
        .bind(file_path)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| row.get("content")).collect())
    }

    /// Close the connection pool, checkpointing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn write_batch(
        &self,
        ids: &[ChunkId],
        texts: &[String],
        metadatas: &[ChunkMetadata],
    ) -> Result<()> {
        let embedded = self.embedder.embed_texts(texts).await?;
        if embedded.len() != texts.len() {
            return Err(EmbedError::invalid_response(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embedded.len()
            ))
            .into());
        }

        let mut tx = self.pool.begin().await?;
        for (((id, text), metadata), embedding) in ids
            .iter()
            .zip(texts)
            .zip(metadatas)
            .zip(&embedded.embeddings)
        {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO chunks
                    (id, file_path, file_name, mtime, chunk_index, total_chunks, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(id)
            .bind(&metadata.file_path)
            .bind(&metadata.file_name)
            .bind(metadata.mtime)
            .bind(metadata.chunk_index as i64)
            .bind(metadata.total_chunks as i64)
            .bind(text)
            .bind(encode_embedding(embedding))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn row_metadata(row: &sqlx::sqlite::SqliteRow) -> ChunkMetadata {
    let chunk_index: i64 = row.get("chunk_index");
    let total_chunks: i64 = row.get("total_chunks");
    ChunkMetadata {
        file_path: row.get("file_path"),
        file_name: row.get("file_name"),
        mtime: row.get("mtime"),
        chunk_index: chunk_index as usize,
        total_chunks: total_chunks as usize,
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        if let Some(dir) = &self.index_dir {
            tokio::fs::create_dir_all(dir).await?;
        }
        self.create_tables().await
    }

    async fn get_all_metadata(&self) -> Result<HashMap<ChunkId, ChunkMetadata>> {
        let rows = sqlx::query(
            "SELECT id, file_path, file_name, mtime, chunk_index, total_chunks FROM chunks",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<String, _>("id"), row_metadata(row)))
            .collect())
    }

    async fn add(
        &self,
        ids: &[ChunkId],
        texts: &[String],
        metadatas: &[ChunkMetadata],
    ) -> Result<()> {
        if ids.len() != texts.len() || ids.len() != metadatas.len() {
            return Err(RetrieverError::LengthMismatch {
                ids: ids.len(),
                texts: texts.len(),
                metadatas: metadatas.len(),
            });
        }

        for start in (0..ids.len()).step_by(WRITE_BATCH_SIZE) {
            let end = (start + WRITE_BATCH_SIZE).min(ids.len());
            self.write_batch(&ids[start..end], &texts[start..end], &metadatas[start..end])
                .await?;
        }
        Ok(())
    }

    async fn delete(&self, ids: &[ChunkId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM chunks WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, file_path, file_name, mtime, chunk_index, total_chunks, content, embedding
             FROM chunks",
        )
        .fetch_all(&self.pool)
        .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_text(text).await?;

        let mut hits: Vec<QueryHit> = rows
            .iter()
            .map(|row| {
                let bytes: Vec<u8> = row.get("embedding");
                let embedding = decode_embedding(&bytes);
                QueryHit {
                    id: row.get("id"),
                    text: row.get("content"),
                    metadata: row_metadata(row),
                    distance: normalized_l2_distance(&query, &embedding),
                }
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn encode_embedding(embedding: &[f16]) -> Vec<u8> {
    bytemuck::cast_slice::<f16, u8>(embedding).to_vec()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f16> {
    // Copy into an f16-aligned buffer; the blob itself carries no alignment guarantee.
    let mut embedding = vec![f16::ZERO; bytes.len() / 2];
    let len = embedding.len() * 2;
    bytemuck::cast_slice_mut::<f16, u8>(&mut embedding).copy_from_slice(&bytes[..len]);
    embedding
}

/// Squared Euclidean distance between `a` and `b` after scaling both to unit length.
fn normalized_l2_distance(a: &[f16], b: &[f16]) -> f32 {
    2.0 * (1.0 - cosine_similarity(a, b))
}

/// Cosine similarity of two vectors. Mismatched lengths and zero vectors score 0.
fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        let x = x.to_f32();
        let y = y.to_f32();
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
