// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding model loading and inference.
//!
//! The gateway serves exactly one model. It is loaded once at startup and
//! shared read-only behind the [`Embedder`] trait.

pub mod error;
pub mod model_files;
pub mod onnx_model;
pub mod pooling;

pub use error::EmbeddingError;
pub use model_files::{resolve_model_files, ModelPaths, ModelSource};
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelOptions};
pub use pooling::PoolingStrategy;

/// A loaded text-embedding model.
///
/// Implementations must be safe to call from several threads at once; any
/// serialization the runtime needs happens inside the implementation.
pub trait Embedder: Send + Sync {
    /// Identifier reported by the health endpoint
    fn model_id(&self) -> &str;

    /// Fixed length of every vector this model produces
    fn dimension(&self) -> usize;

    /// Embeds `texts` in order. All-or-nothing: any failure fails the batch.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds one text through the batch path
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| EmbeddingError::UnexpectedOutput("empty batch result".to_string()))
    }
}
