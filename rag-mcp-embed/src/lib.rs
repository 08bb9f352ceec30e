//! # rag-mcp-embed
//!
//! Turns text into embedding vectors by calling an OpenAI-compatible `/embeddings`
//! endpoint, such as the ones served by LM Studio, Ollama or vLLM.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rag_mcp_embed::{EmbedConfig, EmbeddingProvider, RemoteEmbedProvider};
//!
//! # async fn example() -> rag_mcp_embed::Result<()> {
//! let config = EmbedConfig::new("http://localhost:1234/v1", "text-embedding-qwen3-embedding-4b");
//! let provider = RemoteEmbedProvider::new(config)?;
//!
//! let texts = vec!["Hello world".to_string(), "How are you?".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! println!("Generated {} embeddings of dimension {}", result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`]: endpoint, credentials and timeout for the remote service
//! - [`provider`]: the [`EmbeddingProvider`] trait and the HTTP implementation
//! - [`error`]: error types and result handling
//!
//! Embeddings are stored as half-precision (f16) vectors to halve their footprint in
//! the chunk store.

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, RemoteEmbedProvider};
