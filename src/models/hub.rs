//! Model artifact resolution through the Hugging Face hub
//!
//! Files land in the standard hub cache, so a second invocation finds them on
//! disk. In offline mode only that cache is consulted.

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Cache, Repo, RepoType};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::models::config::ModelSourceConfig;
use crate::models::{EmbeddingError, EmbeddingResult};

/// Hub repository of the embedding model
pub const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// ONNX export inside the repository
pub const MODEL_FILENAME: &str = "onnx/model.onnx";

/// Tokenizer definition inside the repository
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Local paths of the resolved artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

/// Resolves the model artifacts for one invocation
#[derive(Debug, Clone)]
pub struct ModelFetcher {
    source: ModelSourceConfig,
}

impl ModelFetcher {
    pub fn new(source: ModelSourceConfig) -> Self {
        Self { source }
    }

    fn repo(&self) -> Repo {
        Repo::with_revision(
            MODEL_ID.to_string(),
            RepoType::Model,
            self.source.revision.clone(),
        )
    }

    fn cache(&self) -> Cache {
        match &self.source.cache_dir {
            Some(dir) => Cache::new(PathBuf::from(dir)),
            None => Cache::default(),
        }
    }

    /// Resolve both artifacts, downloading them unless offline.
    ///
    /// Blocks on network I/O; call from a blocking context.
    pub fn fetch(&self) -> EmbeddingResult<ModelFiles> {
        let files = if self.source.offline {
            self.fetch_cached()?
        } else {
            self.fetch_remote()?
        };

        debug!(
            "Resolved {} to {} and {}",
            MODEL_ID,
            files.model_path.display(),
            files.tokenizer_path.display()
        );
        Ok(files)
    }

    fn fetch_cached(&self) -> EmbeddingResult<ModelFiles> {
        info!("Resolving {} from local cache (offline)", MODEL_ID);
        let cache_repo = self.cache().repo(self.repo());

        let lookup = |file: &str| {
            cache_repo
                .get(file)
                .ok_or_else(|| EmbeddingError::ModelNotFound {
                    model_name: MODEL_ID.to_string(),
                    file: file.to_string(),
                })
        };

        Ok(ModelFiles {
            model_path: lookup(MODEL_FILENAME)?,
            tokenizer_path: lookup(TOKENIZER_FILENAME)?,
        })
    }

    fn fetch_remote(&self) -> EmbeddingResult<ModelFiles> {
        info!("Fetching {} (revision {})", MODEL_ID, self.source.revision);

        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = &self.source.cache_dir {
            builder = builder.with_cache_dir(PathBuf::from(dir));
        }
        let api = builder.build().map_err(|e| EmbeddingError::DownloadFailed {
            model_name: MODEL_ID.to_string(),
            file: String::new(),
            error: e.to_string(),
        })?;
        let api_repo = api.repo(self.repo());

        let download = |file: &str| {
            api_repo
                .get(file)
                .map_err(|e| EmbeddingError::DownloadFailed {
                    model_name: MODEL_ID.to_string(),
                    file: file.to_string(),
                    error: e.to_string(),
                })
        };

        Ok(ModelFiles {
            model_path: download(MODEL_FILENAME)?,
            tokenizer_path: download(TOKENIZER_FILENAME)?,
        })
    }
}
