//! Embedding Requestor
//!
//! One invocation is a straight line: parse the argument, load the model,
//! embed every text in one batch call, render the result.

use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::models::model::onnx::OnnxEmbeddingModel;
use crate::models::{EmbedderConfig, Embedding, EmbeddingError, EmbeddingModel, EmbeddingResult};
use crate::protocol::{chunk_text, parse_texts, render_embeddings};

pub struct EmbeddingRequestor {
    config: EmbedderConfig,
}

impl EmbeddingRequestor {
    pub fn new(config: EmbedderConfig) -> Self {
        Self { config }
    }

    /// Embed the texts in `raw` with the pretrained model and return the
    /// output line (without trailing newline).
    ///
    /// The argument is parsed before the model is touched, so malformed input
    /// never triggers a download.
    #[instrument(skip_all, fields(input_len = raw.len()))]
    pub async fn run(&self, raw: &str) -> EmbeddingResult<String> {
        let texts = parse_texts(raw)?;
        debug!("Parsed {} texts", texts.len());

        let model = OnnxEmbeddingModel::load(&self.config).await?;
        self.embed_and_render(&model, &texts).await
    }

    /// Same as [`run`](Self::run) with an already constructed model.
    pub async fn run_with_model(
        &self,
        model: &dyn EmbeddingModel,
        raw: &str,
    ) -> EmbeddingResult<String> {
        let texts = parse_texts(raw)?;
        self.embed_and_render(model, &texts).await
    }

    /// Split raw `text` into sentence chunks of at most `max_chars` and embed
    /// each chunk, in order.
    #[instrument(skip_all, fields(input_len = text.len(), max_chars))]
    pub async fn run_chunked(&self, text: &str, max_chars: usize) -> EmbeddingResult<String> {
        let chunks = chunk_text(text, max_chars);
        debug!("Split text into {} chunks", chunks.len());

        let model = OnnxEmbeddingModel::load(&self.config).await?;
        self.embed_and_render(&model, &chunks).await
    }

    /// Same as [`run_chunked`](Self::run_chunked) with an already constructed
    /// model.
    pub async fn run_chunked_with_model(
        &self,
        model: &dyn EmbeddingModel,
        text: &str,
        max_chars: usize,
    ) -> EmbeddingResult<String> {
        let chunks = chunk_text(text, max_chars);
        self.embed_and_render(model, &chunks).await
    }

    async fn embed_and_render(
        &self,
        model: &dyn EmbeddingModel,
        texts: &[String],
    ) -> EmbeddingResult<String> {
        let started = Instant::now();
        let embeddings = request_embeddings(model, texts).await?;

        if self.config.monitoring.log_inference_times {
            info!(
                "Embedded {} texts with {} in {:?}",
                texts.len(),
                model.info().name,
                started.elapsed()
            );
        }

        render_embeddings(&embeddings)
    }
}

/// Embed `texts` in a single batch call and check the result shape.
///
/// The model must return exactly one vector per text, each of the model's
/// dimension.
pub async fn request_embeddings(
    model: &dyn EmbeddingModel,
    texts: &[String],
) -> EmbeddingResult<Vec<Embedding>> {
    let embeddings = model.embed_batch(texts).await?;

    if embeddings.len() != texts.len() {
        return Err(EmbeddingError::InferenceError {
            model_name: model.info().name.clone(),
            error: format!(
                "expected {} embeddings, model returned {}",
                texts.len(),
                embeddings.len()
            ),
        });
    }

    let dimension = model.dimension();
    if let Some((index, bad)) = embeddings
        .iter()
        .enumerate()
        .find(|(_, e)| e.len() != dimension)
    {
        return Err(EmbeddingError::InferenceError {
            model_name: model.info().name.clone(),
            error: format!(
                "embedding {} has {} dimensions, expected {}",
                index,
                bad.len(),
                dimension
            ),
        });
    }

    Ok(embeddings)
}
