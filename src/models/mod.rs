//! Embedding model types, configuration and artifact resolution

pub mod config;
pub mod hub;
pub mod model;

// Re-exports
pub use config::EmbedderConfig;
pub use hub::{ModelFetcher, ModelFiles};
pub use model::{EmbeddingModel, ModelInfo};

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Result type for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors that can occur while producing embeddings
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Model not found: {model_name} ({file})")]
    ModelNotFound { model_name: String, file: String },

    #[error("Download failed: {model_name}/{file} - {error}")]
    DownloadFailed {
        model_name: String,
        file: String,
        error: String,
    },

    #[error("Model load failed: {error}")]
    ModelLoadFailed { error: String },

    #[error("Inference failed: {model_name} - {error}")]
    InferenceError { model_name: String, error: String },

    #[error("IO error: {error}")]
    IoError { error: std::io::Error },

    #[error("TOML parsing error: {error}")]
    TomlError { error: toml::de::Error },

    #[error("JSON error: {error}")]
    JsonError { error: serde_json::Error },
}

impl From<std::io::Error> for EmbeddingError {
    fn from(error: std::io::Error) -> Self {
        EmbeddingError::IoError { error }
    }
}

impl From<toml::de::Error> for EmbeddingError {
    fn from(error: toml::de::Error) -> Self {
        EmbeddingError::TomlError { error }
    }
}

impl From<serde_json::Error> for EmbeddingError {
    fn from(error: serde_json::Error) -> Self {
        EmbeddingError::JsonError { error }
    }
}
