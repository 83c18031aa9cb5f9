//! ONNX Runtime embedding engine

pub mod onnx_engine;
pub use onnx_engine::{OnnxConfig, OnnxEmbeddingEngine};
