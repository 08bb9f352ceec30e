use crate::ServerConfig;
use crate::response::ToolResponse;
use rag_mcp_retriever::retrieval::search::SearchAggregator;
use rmcp::schemars;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Search request when the server answers for any registered directory.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    #[schemars(description = "Keyword or natural language query to search for")]
    pub keyword: String,
    #[schemars(
        description = "Absolute path of an indexed directory to search; all indexed directories are searched when omitted"
    )]
    pub dir_path: Option<String>,
}

/// Search request when the server is pinned to a single directory.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PinnedSearchRequest {
    #[schemars(description = "Keyword or natural language query to search for")]
    pub keyword: String,
}

impl From<PinnedSearchRequest> for SearchRequest {
    fn from(request: PinnedSearchRequest) -> Self {
        Self {
            keyword: request.keyword,
            dir_path: None,
        }
    }
}

pub async fn search_rag(
    config: &ServerConfig,
    aggregator: &SearchAggregator,
    request: SearchRequest,
) -> ToolResponse {
    info!(
        "Processing search: keyword='{}', dir_path={:?}",
        request.keyword, request.dir_path
    );

    let requested = request
        .dir_path
        .as_deref()
        .filter(|dir| !dir.is_empty() && config.scope.accepts_directory())
        .map(Path::new);
    let roots = config.scope.resolve(requested, &config.registry);

    aggregator.search(&request.keyword, &roots).await.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rag_mcp_embed::{EmbeddingProvider, EmbeddingResult};
    use rag_mcp_retriever::config::AppConfig;
    use rag_mcp_retriever::registry::RootRegistry;
    use rag_mcp_retriever::retrieval::search::SearchScope;
    use std::sync::Arc;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    struct NoEmbedder;

    #[async_trait]
    impl EmbeddingProvider for NoEmbedder {
        async fn embed_texts(&self, _texts: &[String]) -> rag_mcp_embed::Result<EmbeddingResult> {
            Err(rag_mcp_embed::EmbedError::invalid_response("not expected"))
        }

        fn provider_name(&self) -> &str {
            "none"
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_empty_dir_path_falls_back_to_registry() {
        let home = tempdir().unwrap();
        let config = ServerConfig::new(
            SearchScope::Registry,
            AppConfig::default(),
            RootRegistry::at(home.path().join("state.json")),
        );
        let aggregator = SearchAggregator::new(Arc::new(NoEmbedder));

        let response = search_rag(
            &config,
            &aggregator,
            SearchRequest {
                keyword: "apple".to_string(),
                dir_path: Some(String::new()),
            },
        )
        .await;

        assert_eq!(response, ToolResponse::NoRoots);
        assert!(logs_contain("Processing search: keyword='apple'"));
    }
}
