//! rag-mcp-retriever: per-directory semantic indexes and cross-directory search
//!
//! Every indexed directory (a *root*) carries its own chunk store under
//! `<root>/.muxue_rag/`. This crate keeps those stores in sync with their file trees and
//! answers queries across any number of them.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: change detection, the sync engine, chunking and search aggregation
//! - **[`storage`]**: the [`storage::ChunkStore`] trait and its SQLite implementation
//! - **[`registry`]**: the persisted list of indexed roots
//! - **[`config`]**: application configuration loaded from TOML
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rag_mcp_embed::RemoteEmbedProvider;
//! use rag_mcp_retriever::config::AppConfig;
//! use rag_mcp_retriever::retrieval::indexing_engine::{IndexingEngine, IndexingEngineConfig};
//! use rag_mcp_retriever::retrieval::search::{SearchAggregator, SearchOutcome};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::default();
//! let embedder = Arc::new(RemoteEmbedProvider::new(config.embed_config())?);
//!
//! let engine_config = IndexingEngineConfig::from_app_config("./notes", &config);
//! let engine = IndexingEngine::open(engine_config, embedder.clone()).await?;
//! let report = engine.sync().await?;
//! println!("{} files indexed", report.files_processed);
//!
//! let aggregator = SearchAggregator::new(embedder);
//! if let SearchOutcome::Found(results) = aggregator
//!     .search("release checklist", &[engine.base_path().to_path_buf()])
//!     .await
//! {
//!     println!("{} matching chunks", results.stats.match_chunk_count);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Files → ChangeDetector → ChunkingStrategy → ChunkStore (embeds + stores)
//!                                                 ↓
//!            RootRegistry → SearchAggregator ← query per root
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod retrieval;
pub mod storage;

#[cfg(test)]
mod testing;

pub use error::{Result, RetrieverError};
