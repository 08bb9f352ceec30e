use crate::ServerConfig;
use crate::response::ToolResponse;
use crate::tools::{
    self,
    read_raw_file::ReadRawFileRequest,
    search_rag::{PinnedSearchRequest, SearchRequest},
};
use anyhow::Result;
use rag_mcp_embed::EmbeddingProvider;
use rag_mcp_retriever::retrieval::search::{SearchAggregator, SearchScope};
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{CallToolResult, Content, ErrorData as McpError, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use tokio::io::{stdin, stdout};
use tracing::info;

/// MCP server exposing `search_rag` and `read_raw_file` over stdio
#[derive(Clone)]
pub struct RagMcpServer {
    config: Arc<ServerConfig>,
    aggregator: SearchAggregator,
    tool_router: ToolRouter<Self>,
}

impl RagMcpServer {
    /// Build a server whose `search_rag` schema matches the configured scope.
    pub fn new(config: ServerConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        info!("Initializing RAG MCP server with scope: {:?}", config.scope);

        let search_tools = if config.scope.accepts_directory() {
            Self::registry_tools()
        } else {
            Self::pinned_tools()
        };

        Self {
            config: Arc::new(config),
            aggregator: SearchAggregator::new(embedder),
            tool_router: search_tools + Self::file_tools(),
        }
    }

    pub fn scope(&self) -> &SearchScope {
        &self.config.scope
    }

    /// Names of the tools offered to clients.
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect()
    }

    pub async fn search(&self, request: SearchRequest) -> ToolResponse {
        tools::search_rag::search_rag(&self.config, &self.aggregator, request).await
    }

    pub async fn read_raw_file(&self, request: ReadRawFileRequest) -> ToolResponse {
        tools::read_raw_file::read_raw_file(request).await
    }

    /// Serve the MCP server using stdio transport
    pub async fn serve_stdio(&self) -> Result<()> {
        info!("Starting MCP server with stdio transport");

        let transport = (stdin(), stdout());
        let server = self.clone().serve(transport).await?;

        let quit_reason = server.waiting().await?;
        info!("MCP server quit: {:?}", quit_reason);
        Ok(())
    }
}

fn respond(response: ToolResponse) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        response.to_json_string(),
    )]))
}

#[tool_router(router = registry_tools)]
impl RagMcpServer {
    #[tool(
        name = "search_rag",
        description = "Semantic search over indexed text files. Returns the closest chunks across indexed directories, ordered by distance."
    )]
    async fn search_registry(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.search(request).await)
    }
}

#[tool_router(router = pinned_tools)]
impl RagMcpServer {
    #[tool(
        name = "search_rag",
        description = "Semantic search over the text files of the directory this server is bound to."
    )]
    async fn search_pinned(
        &self,
        Parameters(request): Parameters<PinnedSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.search(request.into()).await)
    }
}

#[tool_router(router = file_tools)]
impl RagMcpServer {
    #[tool(
        name = "read_raw_file",
        description = "Read the full content of a plain text file together with its size and modification time."
    )]
    async fn read_file(
        &self,
        Parameters(request): Parameters<ReadRawFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(self.read_raw_file(request).await)
    }
}

#[tool_handler]
impl ServerHandler for RagMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "RAG MCP server - semantic search over locally indexed directories and raw file reads"
                    .into(),
            ),
            ..Default::default()
        }
    }
}
