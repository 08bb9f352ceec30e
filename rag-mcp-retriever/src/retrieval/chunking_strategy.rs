use rag_mcp_context::{TextChunk, chunk_text};
use std::path::Path;

/// Default number of chunks a file is split into
pub const DEFAULT_CHUNK_COUNT: usize = 5;

/// Configuration for chunking files
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target number of chunks per file
    pub chunk_count: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_count: DEFAULT_CHUNK_COUNT,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_count: usize) -> Self {
        Self { chunk_count }
    }
}

/// Strategy for chunking files - delegates entirely to rag-mcp-context
#[derive(Debug, Clone, Default)]
pub struct ChunkingStrategy {
    config: ChunkingConfig,
}

impl ChunkingStrategy {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn chunk_count(&self) -> usize {
        self.config.chunk_count
    }

    /// Chunk a file's content
    pub fn chunk_content(&self, file_path: &Path, content: &str) -> Vec<TextChunk> {
        let chunks = chunk_text(content, self.config.chunk_count);

        tracing::debug!(
            "Chunked {} into {} chunks (target: {})",
            file_path.display(),
            chunks.len(),
            self.config.chunk_count
        );

        chunks
    }
}
