//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use half::f16;
use serde::{Deserialize, Serialize};

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text
    pub embeddings: Vec<Vec<f16>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result from a vector of f16 embeddings.
    ///
    /// The dimension is inferred from the first embedding vector, or 0 when empty.
    pub fn new(embeddings: Vec<Vec<f16>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        let result = self.embed_texts(&[text.to_string()]).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::invalid_response("no embedding returned"))
    }

    /// Generate embeddings for multiple texts, in input order
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Provider backed by an OpenAI-compatible HTTP `/embeddings` endpoint.
///
/// One POST is issued per [`EmbeddingProvider::embed_texts`] call carrying every input;
/// callers are expected to batch. Response items are reordered by their `index` field,
/// so the output always lines up with the input.
#[derive(Debug, Clone)]
pub struct RemoteEmbedProvider {
    config: EmbedConfig,
    client: reqwest::Client,
}

impl RemoteEmbedProvider {
    /// Build a provider for `config`. No request is made until the first embedding call.
    pub fn new(config: EmbedConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbedProvider {
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(Vec::new()));
        }

        let url = self.config.embeddings_url();
        tracing::debug!(
            "Requesting {} embeddings from {} (model {})",
            texts.len(),
            url,
            self.config.model_name
        );

        let mut request = self.client.post(&url).json(&EmbeddingsRequest {
            model: &self.config.model_name,
            input: texts,
        });
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Embedding service at {} returned {}", url, status);
            return Err(EmbedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let mut parsed: EmbeddingsResponse = serde_json::from_slice(&body)
            .map_err(|e| EmbedError::invalid_response(format!("malformed JSON body: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(EmbedError::invalid_response(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|item| item.index);
        if let Some((position, item)) = parsed
            .data
            .iter()
            .enumerate()
            .find(|(position, item)| item.index != *position)
        {
            return Err(EmbedError::invalid_response(format!(
                "embedding indices must cover 0..{}, found {} at position {position}",
                texts.len(),
                item.index
            )));
        }

        let embeddings = parsed
            .data
            .into_iter()
            .map(|item| item.embedding.into_iter().map(f16::from_f32).collect())
            .collect();

        Ok(EmbeddingResult::new(embeddings))
    }

    fn provider_name(&self) -> &str {
        "openai-compatible"
    }
}
