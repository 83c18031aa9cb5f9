//! Runtime configuration for the embedding requestor
//!
//! Loaded from an optional TOML file. Every section and field has a default,
//! so an empty file (or no file at all) yields a usable configuration. None of
//! these settings change which model is used.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{EmbeddingError, EmbeddingResult};

/// Upper bound on positions supported by the BERT encoder
pub const MAX_POSITION_EMBEDDINGS: usize = 512;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Where and how model artifacts are resolved
    pub model: ModelSourceConfig,
    /// Inference settings
    pub runtime: RuntimeConfig,
    /// Logging settings
    pub monitoring: MonitoringConfig,
}

/// Model artifact source
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSourceConfig {
    /// Hugging Face cache directory; `None` uses `HF_HOME` or the default cache
    pub cache_dir: Option<String>,
    /// Repository revision to fetch
    pub revision: String,
    /// Only consult the local cache, never the network
    pub offline: bool,
}

impl Default for ModelSourceConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            revision: "main".to_string(),
            offline: false,
        }
    }
}

/// Inference settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// ONNX Runtime intra-op threads
    pub num_threads: usize,
    /// Texts per session run
    pub batch_size: usize,
    /// Tokens per text after truncation (special tokens included)
    pub max_sequence_length: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            num_threads: 4,
            batch_size: 32,
            max_sequence_length: 256,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub log_inference_times: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_inference_times: false,
        }
    }
}

impl EmbedderConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> EmbeddingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> EmbeddingResult<Self> {
        let config: EmbedderConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> EmbeddingResult<()> {
        if self.runtime.num_threads == 0 {
            return Err(EmbeddingError::ConfigError {
                message: "runtime.num_threads must be at least 1".to_string(),
            });
        }

        if self.runtime.batch_size == 0 {
            return Err(EmbeddingError::ConfigError {
                message: "runtime.batch_size must be at least 1".to_string(),
            });
        }

        // [CLS] and [SEP] need room
        let seq = self.runtime.max_sequence_length;
        if !(2..=MAX_POSITION_EMBEDDINGS).contains(&seq) {
            return Err(EmbeddingError::ConfigError {
                message: format!(
                    "runtime.max_sequence_length must be between 2 and {}, got {}",
                    MAX_POSITION_EMBEDDINGS, seq
                ),
            });
        }

        if self.model.revision.trim().is_empty() {
            return Err(EmbeddingError::ConfigError {
                message: "model.revision must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Tracing filter directive derived from `monitoring.log_level`
    pub fn log_filter(&self) -> String {
        match self.monitoring.log_level.to_lowercase().as_str() {
            "trace" => "embedding_requestor=trace,warn".to_string(),
            "debug" => "embedding_requestor=debug,warn".to_string(),
            "info" => "embedding_requestor=info,warn".to_string(),
            "error" => "embedding_requestor=error,error".to_string(),
            "off" => "off".to_string(),
            _ => "embedding_requestor=warn,warn".to_string(),
        }
    }
}
