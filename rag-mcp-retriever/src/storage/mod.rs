//! Storage abstraction for indexed chunks.
//!
//! Each indexed root owns one chunk collection kept under `<root>/.muxue_rag/`. The
//! [`ChunkStore`] trait is the only way the sync engine and the search aggregator touch
//! that collection; [`sqlite_store::SqliteStore`] is the concrete implementation.
//!
//! ## Record Layout
//!
//! | field          | meaning                                              |
//! |----------------|------------------------------------------------------|
//! | `id`           | random UUID v4, unique within the root               |
//! | `file_path`    | absolute path of the source file                     |
//! | `file_name`    | base name of the source file                         |
//! | `mtime`        | source modification time (Unix seconds) at indexing  |
//! | `chunk_index`  | position of the chunk within its file, from 0        |
//! | `total_chunks` | number of chunks the file produced                   |
//!
//! The chunk text and its embedding are held by the store alongside the metadata.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod sqlite_store;

/// Hidden folder inside every indexed root.
pub const INDEX_DIR_NAME: &str = ".muxue_rag";

/// Maximum number of records written per transaction.
pub const WRITE_BATCH_SIZE: usize = 100;

/// Identifier of a stored chunk.
pub type ChunkId = String;

/// Everything the store knows about a chunk apart from its text and embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_path: String,
    pub file_name: String,
    pub mtime: f64,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// One result of a similarity query.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Squared L2 distance between the normalized query and chunk vectors, lower is closer
    pub distance: f32,
}

/// Location of the index folder for `root`.
pub fn index_dir(root: &Path) -> PathBuf {
    root.join(INDEX_DIR_NAME)
}

/// Whether `root` has been indexed at least once.
pub fn has_index(root: &Path) -> bool {
    index_dir(root).is_dir()
}

/// Chunk collection of a single root.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Create the backing storage if needed. Safe to call repeatedly.
    async fn initialize(&self) -> Result<()>;

    /// Metadata of every stored chunk, keyed by id
    async fn get_all_metadata(&self) -> Result<HashMap<ChunkId, ChunkMetadata>>;

    /// Embed `texts` and store them under `ids` with `metadatas`.
    ///
    /// The three slices must have the same length.
    async fn add(&self, ids: &[ChunkId], texts: &[String], metadatas: &[ChunkMetadata])
    -> Result<()>;

    /// Remove chunks by id. Unknown ids are ignored.
    async fn delete(&self, ids: &[ChunkId]) -> Result<()>;

    /// The `top_k` chunks closest to `text`, ordered by ascending distance
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryHit>>;
}
