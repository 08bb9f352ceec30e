//! Deterministic embedding provider for unit tests.

use async_trait::async_trait;
use half::f16;
use rag_mcp_embed::{EmbedError, EmbeddingProvider, EmbeddingResult};
use std::sync::Mutex;

const VOCABULARY: &[&str] = &["apple", "banana", "cherry", "durian", "elderberry"];

/// Embeds text as word counts over a tiny vocabulary plus a small constant component,
/// so texts sharing no vocabulary word are nearly orthogonal.
#[derive(Debug, Default)]
pub struct KeywordEmbedder {
    batches: Mutex<Vec<usize>>,
    failure_marker: Option<String>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any batch containing `marker`.
    pub fn failing_on(marker: &str) -> Self {
        Self {
            failure_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    /// Size of every batch embedded so far.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn embed(text: &str) -> Vec<f16> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f16> = VOCABULARY
            .iter()
            .map(|word| {
                let count = lower
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|token| token == word)
                    .count();
                f16::from_f32(count as f32)
            })
            .collect();
        vector.push(f16::from_f32(0.01));
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> rag_mcp_embed::Result<EmbeddingResult> {
        if let Some(marker) = &self.failure_marker {
            if texts.iter().any(|t| t.contains(marker.as_str())) {
                return Err(EmbedError::Status {
                    status: 500,
                    body: "embedding backend exploded".to_string(),
                });
            }
        }
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(texts.len());
        }
        Ok(EmbeddingResult::new(
            texts.iter().map(|t| Self::embed(t)).collect(),
        ))
    }

    fn provider_name(&self) -> &str {
        "keyword-test"
    }
}
