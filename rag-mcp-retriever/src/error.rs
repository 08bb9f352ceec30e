//! Error type shared by the storage, registry and configuration layers.

use rag_mcp_embed::EmbedError;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RetrieverError>;

#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// The configuration file exists but is not valid TOML for [`crate::config::AppConfig`]
    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Directory does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The root has no `.muxue_rag` index to open
    #[error("No index found under {root}")]
    StorageUnavailable { root: PathBuf },

    #[error("Length mismatch: {ids} ids, {texts} texts, {metadatas} metadata entries")]
    LengthMismatch {
        ids: usize,
        texts: usize,
        metadatas: usize,
    },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
