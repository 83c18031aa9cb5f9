//! Embedding Requestor Library
//!
//! Turns a JSON list of texts into sentence embeddings with
//! all-MiniLM-L6-v2 on ONNX Runtime.

pub mod models;
pub mod onnx;
pub mod protocol;
pub mod requestor;

// Re-exports
pub use models::{EmbedderConfig, Embedding, EmbeddingError, EmbeddingModel, EmbeddingResult};
pub use protocol::{chunk_text, parse_texts, render_embeddings};
pub use requestor::{request_embeddings, EmbeddingRequestor};
