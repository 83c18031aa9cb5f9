//! Model definitions and traits
//!
//! `EmbeddingModel` is the seam between the request pipeline and the inference
//! backend. The ONNX implementation is the only production backend.

use async_trait::async_trait;

use crate::models::{Embedding, EmbeddingResult};

/// Information about a model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Short model name
    pub name: String,
    /// Hub repository id
    pub repo_id: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Maximum sequence length
    pub max_sequence_length: usize,
    /// Pooling mode
    pub pooling_mode: String,
    /// Whether output vectors have unit length
    pub normalized: bool,
}

impl ModelInfo {
    /// all-MiniLM-L6-v2 with the given truncation length
    pub fn all_minilm_l6_v2(max_sequence_length: usize) -> Self {
        Self {
            name: "all-MiniLM-L6-v2".to_string(),
            repo_id: crate::models::hub::MODEL_ID.to_string(),
            dimension: 384,
            max_sequence_length,
            pooling_mode: "mean".to_string(),
            normalized: true,
        }
    }
}

/// Core embedding model trait
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate embeddings for a batch of texts, one per text, in order
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize {
        self.info().dimension
    }
}

/// ONNX-based embedding model implementation
pub mod onnx {
    use super::*;
    use crate::models::config::EmbedderConfig;
    use crate::models::hub::ModelFetcher;
    use crate::models::EmbeddingError;
    use crate::onnx::{OnnxConfig, OnnxEmbeddingEngine};
    use tokio::sync::Mutex;
    use tracing::info;

    /// ONNX embedding model
    pub struct OnnxEmbeddingModel {
        info: ModelInfo,
        engine: Mutex<OnnxEmbeddingEngine>,
    }

    impl OnnxEmbeddingModel {
        /// Resolve the artifacts and build the ONNX session.
        ///
        /// Download and session construction both block, so they run on
        /// the blocking pool.
        pub async fn load(config: &EmbedderConfig) -> EmbeddingResult<Self> {
            let info = ModelInfo::all_minilm_l6_v2(config.runtime.max_sequence_length);
            let fetcher = ModelFetcher::new(config.model.clone());
            let onnx_config = OnnxConfig::from(&config.runtime);
            let name = info.name.clone();

            let engine = tokio::task::spawn_blocking(move || {
                let files = fetcher.fetch()?;
                OnnxEmbeddingEngine::new(&name, &files.model_path, &files.tokenizer_path, &onnx_config)
            })
            .await
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Model loading task failed: {}", e),
            })??;

            info!("Loaded {} ({} dimensions)", info.repo_id, info.dimension);
            Ok(Self {
                info,
                engine: Mutex::new(engine),
            })
        }
    }

    #[async_trait]
    impl EmbeddingModel for OnnxEmbeddingModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
            let mut engine = self.engine.lock().await;
            engine.embed_texts(texts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_info() {
        let info = ModelInfo::all_minilm_l6_v2(256);

        assert_eq!(info.name, "all-MiniLM-L6-v2");
        assert_eq!(info.repo_id, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(info.dimension, 384);
        assert_eq!(info.max_sequence_length, 256);
        assert!(info.normalized);
    }
}
