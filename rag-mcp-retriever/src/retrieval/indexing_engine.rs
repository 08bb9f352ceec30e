//! Incremental synchronization of one root's index with its directory tree.
//!
//! A sync is a single pass:
//!
//! ```text
//! stored metadata ─┐
//!                  ├─ ChangeSet ─→ delete removed files ─→ delete outdated chunks
//! directory walk ──┘                                           │
//!                              write fresh chunks  ←─ chunk ←─ read (per changed file)
//! ```
//!
//! Unchanged files are never read, embedded or written. A file that fails to read,
//! decode, embed or store is logged, counted in [`SyncReport::errors`] and skipped; the
//! rest of the tree is still processed.
//!
//! Outdated chunks are removed before the replacement chunks are written, so a file whose
//! re-embedding fails stays out of the index until the next successful sync picks it up
//! again (its recorded mtime is gone with its chunks).

use anyhow::{Context, Result};
use rag_mcp_embed::EmbeddingProvider;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::change_detector::{detect_changes, path_key};
use super::chunking_strategy::{ChunkingConfig, ChunkingStrategy};
use crate::config::AppConfig;
use crate::error::RetrieverError;
use crate::storage::sqlite_store::SqliteStore;
use crate::storage::{ChunkId, ChunkMetadata, ChunkStore};

/// Progress is logged after this many processed files.
const PROGRESS_INTERVAL: usize = 10;

/// Configuration for the indexing engine
#[derive(Debug, Clone)]
pub struct IndexingEngineConfig {
    /// Root directory being indexed
    pub base_path: PathBuf,
    /// Chunking configuration
    pub chunking_config: ChunkingConfig,
}

impl IndexingEngineConfig {
    /// Configuration for `base_path` with the default chunk count.
    ///
    /// The path is made absolute so stored file paths are absolute too.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: crate::registry::normalize(base_path.as_ref()),
            chunking_config: ChunkingConfig::default(),
        }
    }

    pub fn from_app_config(base_path: impl AsRef<Path>, config: &AppConfig) -> Self {
        Self::new(base_path).with_chunk_count(config.processing.chunk_count)
    }

    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunking_config = ChunkingConfig::new(chunk_count);
        self
    }

    /// Check that the root exists and is a directory.
    pub fn validate(&self) -> crate::Result<()> {
        match std::fs::metadata(&self.base_path) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(RetrieverError::NotADirectory {
                path: self.base_path.clone(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RetrieverError::PathNotFound {
                path: self.base_path.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Outcome of one [`IndexingEngine::sync`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Indexable files found in the tree
    pub files_scanned: usize,
    /// New or modified files indexed successfully
    pub files_processed: usize,
    /// Files removed from the index because they disappeared
    pub files_deleted: usize,
    pub chunks_written: usize,
    /// Files that failed and were skipped
    pub errors: usize,
}

/// Keeps one root's chunk store in step with the files under it.
pub struct IndexingEngine {
    config: IndexingEngineConfig,
    store: Arc<dyn ChunkStore>,
    chunking_strategy: ChunkingStrategy,
}

impl std::fmt::Debug for IndexingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexingEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IndexingEngine {
    /// Create an engine writing to `store`.
    pub fn new(config: IndexingEngineConfig, store: Arc<dyn ChunkStore>) -> Self {
        let chunking_strategy = ChunkingStrategy::new(config.chunking_config.clone());
        Self {
            config,
            store,
            chunking_strategy,
        }
    }

    /// Create an engine backed by the on-disk SQLite index of the configured root.
    pub async fn open(
        config: IndexingEngineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        info!("Opening index for {}", config.base_path.display());
        config.validate()?;
        let store = SqliteStore::open(&config.base_path, embedder)
            .await
            .with_context(|| format!("Failed to open index for {}", config.base_path.display()))?;
        Ok(Self::new(config, Arc::new(store)))
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Bring the index in line with the directory tree.
    pub async fn sync(&self) -> Result<SyncReport> {
        let start_time = Instant::now();
        let root = &self.config.base_path;
        info!("Starting sync of {}", root.display());

        self.config.validate()?;
        self.store.initialize().await?;
        let existing = self
            .store
            .get_all_metadata()
            .await
            .context("Failed to load existing chunk metadata")?;
        let (ids_by_file, previous_mtimes) = group_by_file(existing);

        let changes = detect_changes(root, &previous_mtimes)
            .await
            .with_context(|| format!("Failed to scan {}", root.display()))?;

        let mut report = SyncReport {
            files_scanned: changes.current_files.len(),
            ..SyncReport::default()
        };
        info!(
            "Scanned {} files: {} to process, {} to delete",
            report.files_scanned,
            changes.to_process.len(),
            changes.to_delete.len()
        );

        if changes.is_empty() {
            info!("Index of {} is up to date", root.display());
            return Ok(report);
        }

        let removed: Vec<ChunkId> = changes
            .to_delete
            .iter()
            .filter_map(|path| ids_by_file.get(path))
            .flatten()
            .cloned()
            .collect();
        if !removed.is_empty() {
            self.store.delete(&removed).await?;
            debug!("Deleted {} chunks of removed files", removed.len());
        }
        report.files_deleted = changes.to_delete.len();

        let outdated: Vec<ChunkId> = changes
            .to_process
            .iter()
            .filter_map(|path| ids_by_file.get(&path_key(path)))
            .flatten()
            .cloned()
            .collect();
        if !outdated.is_empty() {
            self.store.delete(&outdated).await?;
            debug!("Deleted {} outdated chunks", outdated.len());
        }

        let total = changes.to_process.len();
        for (position, path) in changes.to_process.iter().enumerate() {
            let mtime = changes.current_files.get(path).copied().unwrap_or_default();
            match self.index_file(path, mtime).await {
                Ok(chunks) => {
                    report.files_processed += 1;
                    report.chunks_written += chunks;
                }
                Err(e) => {
                    error!("Failed to index {}: {:#}", path.display(), e);
                    report.errors += 1;
                }
            }

            let done = position + 1;
            if done % PROGRESS_INTERVAL == 0 {
                info!("Progress: {}/{} files", done, total);
            }
        }

        info!(
            "Finished sync of {} in {:.2?}: {} processed, {} deleted, {} chunks written, {} errors",
            root.display(),
            start_time.elapsed(),
            report.files_processed,
            report.files_deleted,
            report.chunks_written,
            report.errors
        );
        Ok(report)
    }

    /// Chunk and store one file, returning the number of chunks written.
    async fn index_file(&self, file_path: &Path, mtime: f64) -> Result<usize> {
        debug!("Processing file: {}", file_path.display());

        let bytes = tokio::fs::read(file_path).await.context("read failed")?;
        let content = String::from_utf8(bytes).context("content is not valid UTF-8")?;

        let chunks = self.chunking_strategy.chunk_content(file_path, &content);
        if chunks.is_empty() {
            return Ok(0);
        }

        let total_chunks = chunks.len();
        let file_path_str = path_key(file_path);
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut ids = Vec::with_capacity(total_chunks);
        let mut texts = Vec::with_capacity(total_chunks);
        let mut metadatas = Vec::with_capacity(total_chunks);
        for chunk in chunks {
            ids.push(Uuid::new_v4().to_string());
            metadatas.push(ChunkMetadata {
                file_path: file_path_str.clone(),
                file_name: file_name.clone(),
                mtime,
                chunk_index: chunk.index,
                total_chunks,
            });
            texts.push(chunk.text);
        }

        self.store.add(&ids, &texts, &metadatas).await?;
        Ok(total_chunks)
    }
}

/// Chunk ids per file path, and the mtime recorded for each file.
fn group_by_file(
    existing: HashMap<ChunkId, ChunkMetadata>,
) -> (HashMap<String, Vec<ChunkId>>, HashMap<String, f64>) {
    let mut ids_by_file: HashMap<String, Vec<ChunkId>> = HashMap::new();
    let mut mtimes = HashMap::new();
    for (id, metadata) in existing {
        mtimes.insert(metadata.file_path.clone(), metadata.mtime);
        ids_by_file.entry(metadata.file_path).or_default().push(id);
    }
    (ids_by_file, mtimes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    async fn memory_engine(
        root: &Path,
        embedder: Arc<KeywordEmbedder>,
    ) -> Result<(IndexingEngine, Arc<SqliteStore>)> {
        memory_engine_with(IndexingEngineConfig::new(root), embedder).await
    }

    async fn memory_engine_with(
        config: IndexingEngineConfig,
        embedder: Arc<KeywordEmbedder>,
    ) -> Result<(IndexingEngine, Arc<SqliteStore>)> {
        let store = Arc::new(SqliteStore::open_memory(&config.base_path, embedder).await?);
        let engine = IndexingEngine::new(config, store.clone());
        Ok((engine, store))
    }

    #[tokio::test]
    async fn test_only_text_files_are_indexed() -> Result<()> {
        let dir = tempdir()?;
        tokio::fs::write(dir.path().join("a.txt"), "apple orchard\nbanana grove\n").await?;
        tokio::fs::write(dir.path().join("b.bin"), [0u8, 159, 146, 150]).await?;

        let (engine, store) = memory_engine(dir.path(), Arc::new(KeywordEmbedder::new())).await?;
        let report = engine.sync().await?;

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.errors, 0);

        let metadata = store.get_all_metadata().await?;
        assert!(!metadata.is_empty());
        assert!(metadata.values().all(|m| m.file_name == "a.txt"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_file_has_no_records() -> Result<()> {
        let dir = tempdir()?;
        tokio::fs::write(dir.path().join("empty.txt"), "").await?;

        let (engine, store) = memory_engine(dir.path(), Arc::new(KeywordEmbedder::new())).await?;
        let report = engine.sync().await?;

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.chunks_written, 0);
        assert_eq!(store.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failing_file_is_logged_and_skipped() -> Result<()> {
        let dir = tempdir()?;
        tokio::fs::write(dir.path().join("good.txt"), "cherry").await?;
        tokio::fs::write(dir.path().join("bad.txt"), "EXPLODE").await?;

        let embedder = Arc::new(KeywordEmbedder::failing_on("EXPLODE"));
        let config = IndexingEngineConfig::new(dir.path()).with_chunk_count(1);
        let (engine, store) = memory_engine_with(config, embedder).await?;
        let report = engine.sync().await?;

        assert_eq!(report.files_processed, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(store.file_chunks(&path_key(&dir.path().join("good.txt"))).await?.len(), 1);
        assert!(logs_contain("Failed to index"));
        assert!(logs_contain("bad.txt"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_utf8_with_text_extension_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        tokio::fs::write(dir.path().join("latin1.txt"), [0x63, 0x61, 0x66, 0xe9]).await?;

        let (engine, store) = memory_engine(dir.path(), Arc::new(KeywordEmbedder::new())).await?;
        let report = engine.sync().await?;

        assert_eq!(report.errors, 1);
        assert_eq!(store.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_progress_is_logged() -> Result<()> {
        let dir = tempdir()?;
        for i in 0..12 {
            tokio::fs::write(dir.path().join(format!("note{i}.txt")), "durian").await?;
        }

        let (engine, _store) = memory_engine(dir.path(), Arc::new(KeywordEmbedder::new())).await?;
        let report = engine.sync().await?;

        assert_eq!(report.files_processed, 12);
        assert!(logs_contain("Progress: 10/12 files"));
        Ok(())
    }

    #[tokio::test]
    async fn test_root_spelling_does_not_change_file_keys() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("proj");
        std::fs::create_dir_all(root.join("sub"))?;
        std::fs::write(root.join("a.txt"), "apple banana")?;

        let (engine, store) = memory_engine(&root, Arc::new(KeywordEmbedder::new())).await?;
        assert_eq!(engine.sync().await?.files_processed, 1);
        let chunks = store.count().await?;

        let dotted = IndexingEngineConfig::new(root.join("sub").join("..").join("."));
        assert_eq!(dotted.base_path, root);

        let again = IndexingEngine::new(dotted, store.clone());
        let report = again.sync().await?;
        assert_eq!(report.files_processed, 0);
        assert_eq!(report.files_deleted, 0);
        assert_eq!(store.count().await?, chunks);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_or_file_root_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("missing");
        let err = IndexingEngineConfig::new(&missing).validate().unwrap_err();
        assert!(matches!(err, RetrieverError::PathNotFound { ref path } if *path == missing));

        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "apple")?;
        let err = IndexingEngineConfig::new(&file).validate().unwrap_err();
        assert!(matches!(err, RetrieverError::NotADirectory { .. }));

        let (engine, _store) = memory_engine(&missing, Arc::new(KeywordEmbedder::new())).await?;
        let err = engine.sync().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RetrieverError>(),
            Some(RetrieverError::PathNotFound { .. })
        ));

        let opened = IndexingEngine::open(
            IndexingEngineConfig::new(&missing),
            Arc::new(KeywordEmbedder::new()),
        )
        .await;
        assert!(opened.is_err());
        assert!(!missing.exists());
        Ok(())
    }

    #[test]
    fn test_group_by_file() {
        let meta = |path: &str, mtime: f64| ChunkMetadata {
            file_path: path.to_string(),
            file_name: String::new(),
            mtime,
            chunk_index: 0,
            total_chunks: 1,
        };
        let existing = HashMap::from([
            ("1".to_string(), meta("/r/a", 1.0)),
            ("2".to_string(), meta("/r/a", 1.0)),
            ("3".to_string(), meta("/r/b", 2.0)),
        ]);

        let (ids, mtimes) = group_by_file(existing);
        let mut a_ids = ids["/r/a"].clone();
        a_ids.sort();
        assert_eq!(a_ids, vec!["1", "2"]);
        assert_eq!(mtimes["/r/b"], 2.0);
    }
}
