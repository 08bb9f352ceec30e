//! Application configuration loaded from a TOML file.
//!
//! Every section and field has a default, so a missing file, an empty file or a file
//! that only sets a few keys all produce a usable [`AppConfig`].
//!
//! ```
//! use rag_mcp_retriever::config::AppConfig;
//!
//! let config = AppConfig::from_toml_str("[processing]\nchunk_count = 8\n").unwrap();
//! assert_eq!(config.processing.chunk_count, 8);
//! assert_eq!(config.llm.base_url, "http://localhost:1234/v1");
//! ```

use crate::error::{Result, RetrieverError};
use rag_mcp_embed::EmbedConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub model: ModelConfig,
    pub processing: ProcessingConfig,
}

/// Connection settings for the embedding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub service_type: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            service_type: "openai".to_string(),
            base_url: "http://localhost:1234/v1".to_string(),
            api_key: None,
            timeout: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub context_window: usize,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "text-embedding-qwen3-embedding-4b".to_string(),
            context_window: 4096,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Target number of chunks per file
    pub chunk_count: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { chunk_count: 5 }
    }
}

impl AppConfig {
    /// Load the configuration at `path`.
    ///
    /// A missing or empty file yields the defaults. A file that exists but cannot be
    /// parsed is a [`RetrieverError::ConfigParse`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "Config file {} not found, using defaults",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        Self::from_toml_str(&content).map_err(|e| match e {
            RetrieverError::ConfigParse { message, .. } => RetrieverError::ConfigParse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Load the configuration, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("{}; using default configuration", e);
            Self::default()
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(content).map_err(|e| RetrieverError::ConfigParse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Settings for the embedding client derived from the `llm` and `model` sections.
    pub fn embed_config(&self) -> EmbedConfig {
        let config = EmbedConfig::new(self.llm.base_url.clone(), self.model.name.clone())
            .with_timeout(Duration::from_secs(self.llm.timeout));
        match &self.llm.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }
}
