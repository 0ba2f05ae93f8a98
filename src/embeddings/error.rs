// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding error types.

use thiserror::Error;

/// Errors raised while loading the model or running inference
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// ONNX Runtime failure (session build or run)
    #[error("ONNX Runtime error: {0}")]
    Runtime(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Model or tokenizer file missing on disk
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to download model: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tensor construction failed
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Model produced an output we cannot pool
    #[error("Unexpected model output: {0}")]
    UnexpectedOutput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The blocking inference worker died or the session lock was poisoned
    #[error("Inference worker failed: {0}")]
    Worker(String),
}

impl EmbeddingError {
    pub(crate) fn runtime(err: impl std::fmt::Display) -> Self {
        EmbeddingError::Runtime(err.to_string())
    }

    pub(crate) fn tokenizer(err: impl std::fmt::Display) -> Self {
        EmbeddingError::Tokenizer(err.to_string())
    }
}
