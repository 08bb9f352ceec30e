//! # rag-mcp
//!
//! A Model Context Protocol (MCP) server that answers semantic queries over locally
//! indexed directories, plus the `rag-mcp` command line tool that builds those indexes.
//!
//! ## Architecture
//!
//! The server ties together the other workspace crates:
//! - `rag-mcp-retriever` for per-directory indexes, the root registry and search
//! - `rag-mcp-embed` for query embeddings
//! - `rag-mcp-context` for deciding which files are plain text
//!
//! ## Quick Start
//!
//! ```bash
//! # Index a directory and remember it in ~/.rag_mcp/state.json
//! rag-mcp --dir ~/notes
//!
//! # Serve every indexed directory
//! rag-mcp
//!
//! # Serve one directory only
//! rag-mcp --dir ~/notes --serve
//! ```
//!
//! ## MCP Tools
//!
//! ### `search_rag`
//! Semantic search. Takes a `keyword` and, unless the server is pinned to one directory,
//! an optional `dir_path`. Results from every searched directory are merged by distance.
//!
//! ### `read_raw_file`
//! Returns the content of a plain text file with its size and modification time.
//!
//! Every tool answers with a JSON `{"code", "message", "data"}` envelope, see
//! [`response::ToolResponse`].
//!
//! ## Integration with MCP clients
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "rag": {
//!       "command": "rag-mcp",
//!       "args": ["--config", "/path/to/config.toml"]
//!     }
//!   }
//! }
//! ```

pub mod logging;
pub mod response;
mod server;
pub mod tools;

pub use server::RagMcpServer;

use anyhow::Result;
use rag_mcp_embed::RemoteEmbedProvider;
use rag_mcp_retriever::config::AppConfig;
use rag_mcp_retriever::registry::RootRegistry;
use rag_mcp_retriever::retrieval::search::SearchScope;
use std::sync::Arc;
use tracing::info;

/// Everything the server needs to answer queries.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Which directories `search_rag` may query
    pub scope: SearchScope,
    pub app_config: AppConfig,
    /// Source of the default search roots
    pub registry: RootRegistry,
}

impl ServerConfig {
    pub fn new(scope: SearchScope, app_config: AppConfig, registry: RootRegistry) -> Self {
        Self {
            scope,
            app_config,
            registry,
        }
    }
}

/// Run the MCP server over stdio until the client disconnects.
///
/// Query embeddings come from the remote provider described by `config.app_config`.
///
/// # Errors
/// - Invalid embedding provider configuration
/// - MCP protocol communication errors
pub async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting MCP Server...");

    let embedder = Arc::new(RemoteEmbedProvider::new(config.app_config.embed_config())?);
    let server = RagMcpServer::new(config, embedder);

    server.serve_stdio().await
}
