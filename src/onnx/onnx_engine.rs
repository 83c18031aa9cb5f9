//! # ONNX Embedding Engine
//!
//! Embedding generation with ONNX Runtime and a HuggingFace tokenizer for the
//! all-MiniLM-L6-v2 sentence transformer.
//!
//! ## Pipeline
//!
//! - Tokenize with special tokens, truncating to `max_seq_length`
//! - Pad each batch to its longest sequence
//! - Run the encoder on `input_ids`, `attention_mask`, `token_type_ids`
//! - Mean pooling over real tokens, then L2 normalization
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = OnnxEmbeddingEngine::new("all-MiniLM-L6-v2", &model_path, &tokenizer_path, &OnnxConfig::from(&RuntimeConfig::default()))?;
//! let embeddings = engine.embed_texts(&["Hello world".to_string()])?;
//! assert_eq!(embeddings[0].len(), 384);
//! ```

use crate::models::config::RuntimeConfig;
use crate::models::{Embedding, EmbeddingError, EmbeddingResult};
use ndarray::{ArrayView2, ArrayView3, Axis};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, instrument};

/// Lower bound for the pooling denominator
const MASK_SUM_EPSILON: f32 = 1e-9;

/// Lower bound for the L2 norm
const NORM_EPSILON: f32 = 1e-12;

/// Configuration for ONNX Runtime
#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// Thread pool size for inference
    pub thread_pool_size: usize,
    /// Texts per session run
    pub batch_size: usize,
    /// Maximum sequence length
    pub max_seq_length: usize,
}

impl From<&RuntimeConfig> for OnnxConfig {
    fn from(runtime: &RuntimeConfig) -> Self {
        Self {
            thread_pool_size: runtime.num_threads,
            batch_size: runtime.batch_size,
            max_seq_length: runtime.max_sequence_length,
        }
    }
}

/// Token ids and masks for one session run, row-major `[rows, seq_len]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PaddedBatch {
    pub rows: usize,
    pub seq_len: usize,
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

/// Right-pad every sequence to the longest one in the batch.
pub(crate) fn pad_batch(sequences: &[(&[u32], &[u32])], pad_id: u32) -> PaddedBatch {
    let rows = sequences.len();
    let seq_len = sequences.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0);

    let mut input_ids = Vec::with_capacity(rows * seq_len);
    let mut attention_mask = Vec::with_capacity(rows * seq_len);

    for (ids, mask) in sequences {
        let padding = seq_len - ids.len();
        input_ids.extend(ids.iter().map(|&id| id as i64));
        input_ids.extend(std::iter::repeat(pad_id as i64).take(padding));
        attention_mask.extend(mask.iter().map(|&m| m as i64));
        attention_mask.extend(std::iter::repeat(0i64).take(padding));
    }

    PaddedBatch {
        rows,
        seq_len,
        input_ids,
        attention_mask,
        token_type_ids: vec![0i64; rows * seq_len],
    }
}

/// Average token vectors where the attention mask is set.
pub(crate) fn mean_pooling(token_embeddings: ArrayView2<f32>, attention_mask: &[i64]) -> Embedding {
    let hidden_size = token_embeddings.shape()[1];
    let mut pooled = vec![0.0f32; hidden_size];
    let mut mask_sum = 0.0f32;

    for (token, &mask) in token_embeddings.outer_iter().zip(attention_mask) {
        if mask == 0 {
            continue;
        }
        let weight = mask as f32;
        mask_sum += weight;
        for (acc, value) in pooled.iter_mut().zip(token.iter()) {
            *acc += value * weight;
        }
    }

    let denominator = mask_sum.max(MASK_SUM_EPSILON);
    for value in &mut pooled {
        *value /= denominator;
    }
    pooled
}

/// L2-normalize in place.
pub(crate) fn normalize(embedding: &mut [f32]) {
    let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt().max(NORM_EPSILON);
    for value in embedding.iter_mut() {
        *value /= norm;
    }
}

fn load_failed<E: std::fmt::Display>(error: E) -> EmbeddingError {
    EmbeddingError::ModelLoadFailed {
        error: error.to_string(),
    }
}

/// ONNX-based embedding engine for generating text embeddings
pub struct OnnxEmbeddingEngine {
    /// ONNX Runtime session for model inference
    session: Session,
    /// HuggingFace tokenizer for text preprocessing
    tokenizer: Tokenizer,
    /// Name used in error reports
    model_name: String,
    pad_id: u32,
    config: OnnxConfig,
}

impl std::fmt::Debug for OnnxEmbeddingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingEngine")
            .field("model_name", &self.model_name)
            .field("pad_id", &self.pad_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingEngine {
    /// Create a new ONNX embedding engine
    ///
    /// # Arguments
    /// * `model_name` - Name reported in errors and logs
    /// * `model_path` - Path to the ONNX model file (model.onnx)
    /// * `tokenizer_path` - Path to the tokenizer file (tokenizer.json)
    /// * `config` - Threading, batching and truncation settings
    pub fn new(
        model_name: &str,
        model_path: &Path,
        tokenizer_path: &Path,
        config: &OnnxConfig,
    ) -> EmbeddingResult<Self> {
        info!(
            "Initializing ONNX embedding engine with model: {}",
            model_path.display()
        );

        let session = Session::builder()
            .map_err(load_failed)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_failed)?
            .with_intra_threads(config.thread_pool_size)
            .map_err(load_failed)?
            .commit_from_file(model_path)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to load ONNX model: {}", e),
            })?;

        let input_names: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
        debug!("Session inputs: {:?}", input_names);

        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                error: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        // Padding happens per batch in pad_batch
        let pad_id = tokenizer.get_padding().map(|p| p.pad_id).unwrap_or(0);
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to configure truncation: {}", e),
            })?;

        info!(
            "ONNX embedding engine initialized with {} threads",
            config.thread_pool_size
        );
        Ok(Self {
            session,
            tokenizer,
            model_name: model_name.to_string(),
            pad_id,
            config: config.clone(),
        })
    }

    fn inference_failed(&self, error: impl std::fmt::Display) -> EmbeddingError {
        EmbeddingError::InferenceError {
            model_name: self.model_name.clone(),
            error: error.to_string(),
        }
    }

    /// Generate embeddings for a batch of texts
    ///
    /// Returns one L2-normalized vector per input text, in input order. An
    /// empty slice yields an empty result without touching the session.
    #[instrument(skip(self, texts), fields(text_count = texts.len()))]
    pub fn embed_texts(&mut self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            embeddings.extend(self.embed_chunk(chunk)?);
        }

        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn embed_chunk(&mut self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| self.inference_failed(format!("Tokenization failed: {}", e)))
            })
            .collect::<EmbeddingResult<Vec<_>>>()?;

        let sequences: Vec<(&[u32], &[u32])> = encodings
            .iter()
            .map(|enc| (enc.get_ids(), enc.get_attention_mask()))
            .collect();
        let batch = pad_batch(&sequences, self.pad_id);
        let shape = [batch.rows as i64, batch.seq_len as i64];

        let input_ids_tensor = Tensor::from_array((shape, batch.input_ids))
            .map_err(|e| self.inference_failed(format!("Failed to create input_ids tensor: {}", e)))?;
        let attention_mask_tensor = Tensor::from_array((shape, batch.attention_mask.clone()))
            .map_err(|e| {
                self.inference_failed(format!("Failed to create attention_mask tensor: {}", e))
            })?;
        let token_type_ids_tensor = Tensor::from_array((shape, batch.token_type_ids))
            .map_err(|e| {
                self.inference_failed(format!("Failed to create token_type_ids tensor: {}", e))
            })?;

        let model_name = self.model_name.clone();
        let failed = |error: String| EmbeddingError::InferenceError {
            model_name: model_name.clone(),
            error,
        };

        let outputs = self
            .session
            .run(vec![
                ("input_ids", input_ids_tensor),
                ("attention_mask", attention_mask_tensor),
                ("token_type_ids", token_type_ids_tensor),
            ])
            .map_err(|e| failed(format!("ONNX inference failed: {}", e)))?;

        // last_hidden_state: [batch, seq_len, hidden]
        let (out_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| failed(format!("Failed to extract output tensor: {}", e)))?;
        let dims: Vec<usize> = out_shape.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[0] != batch.rows || dims[1] != batch.seq_len {
            return Err(failed(format!(
                "Unexpected output shape {:?} for batch [{}, {}]",
                dims, batch.rows, batch.seq_len
            )));
        }

        let hidden_states = ArrayView3::from_shape((dims[0], dims[1], dims[2]), data)
            .map_err(|e| failed(format!("Failed to create output array view: {}", e)))?;

        let embeddings = hidden_states
            .axis_iter(Axis(0))
            .zip(batch.attention_mask.chunks(batch.seq_len.max(1)))
            .map(|(tokens, mask)| {
                let mut embedding = mean_pooling(tokens, mask);
                normalize(&mut embedding);
                embedding
            })
            .collect();

        Ok(embeddings)
    }
}
