//! Shared helpers for the retriever integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use half::f16;
use rag_mcp_embed::{EmbedError, EmbeddingProvider, EmbeddingResult};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

const VOCABULARY: &[&str] = &["apple", "banana", "cherry", "durian", "elderberry"];

/// Word counts over a fixed vocabulary, plus a small constant so no vector is zero.
#[derive(Debug, Default)]
pub struct VocabularyEmbedder {
    texts_embedded: AtomicUsize,
    failure_marker: Option<String>,
}

impl VocabularyEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            failure_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for VocabularyEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> rag_mcp_embed::Result<EmbeddingResult> {
        if let Some(marker) = &self.failure_marker {
            if texts.iter().any(|t| t.contains(marker.as_str())) {
                return Err(EmbedError::Status {
                    status: 503,
                    body: "model unavailable".to_string(),
                });
            }
        }
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);

        let embeddings = texts
            .iter()
            .map(|text| {
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
            })
            .collect();
        Ok(EmbeddingResult::new(embeddings))
    }

    fn provider_name(&self) -> &str {
        "vocabulary-test"
    }
}

/// Push a file's modification time forward so the change is visible regardless of the
/// filesystem's timestamp resolution.
pub fn touch_forward(path: &Path, seconds: u64) -> std::io::Result<()> {
    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_modified(SystemTime::now() + Duration::from_secs(seconds))
}
