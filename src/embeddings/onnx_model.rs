// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs a sentence-transformer style ONNX export (BGE, MiniLM, ...) with
//! ONNX Runtime and a HuggingFace tokenizer.
//!
//! Features:
//! - Model files from a local directory or the Hugging Face Hub
//! - Optional CUDA acceleration with CPU fallback (`cuda` feature)
//! - Per-batch padding, truncation to a configured max length
//! - CLS or mean pooling, optional L2 normalization
//! - Output dimension discovered from a probe inference at load time

use ndarray::Array2;
use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::{TensorRef, Value};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

use crate::embeddings::model_files::{resolve_model_files, ModelPaths, ModelSource};
use crate::embeddings::pooling::{l2_normalize, pool_batch, PoolingStrategy};
use crate::embeddings::{Embedder, EmbeddingError};

/// Probe text used to discover the output dimension
const PROBE_TEXT: &str = "validation test";

/// Inference settings for [`OnnxEmbeddingModel`]
#[derive(Debug, Clone)]
pub struct OnnxModelOptions {
    pub pooling: PoolingStrategy,
    pub normalize: bool,
    /// Upper bound on tokens per text. The limit in tokenizer.json is kept
    /// when it is lower, or when this is `None`.
    pub max_length: Option<usize>,
    /// Number of texts per ONNX run
    pub batch_size: usize,
    pub intra_threads: usize,
}

impl Default for OnnxModelOptions {
    fn default() -> Self {
        Self {
            pooling: PoolingStrategy::Cls,
            normalize: true,
            max_length: None,
            batch_size: 32,
            intra_threads: 4,
        }
    }
}

/// ONNX-based embedding model
///
/// The session needs exclusive access for `run`, so it sits behind a mutex
/// and concurrent requests are serialized. The tokenizer is read-only.
pub struct OnnxEmbeddingModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_id: String,
    /// Fixed output dimension, measured at load
    dimension: usize,
    pad_id: u32,
    /// BERT exports take `token_type_ids`, XLM-RoBERTa exports do not
    uses_token_type_ids: bool,
    options: OnnxModelOptions,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_id", &self.model_id)
            .field("dimension", &self.dimension)
            .field("uses_token_type_ids", &self.uses_token_type_ids)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Resolves the model files and loads the model. Blocking.
    pub fn load(
        model_id: impl Into<String>,
        source: &ModelSource,
        options: OnnxModelOptions,
    ) -> Result<Self, EmbeddingError> {
        let paths = resolve_model_files(source)?;
        Self::new(model_id, &paths, options)
    }

    /// Loads the ONNX session and tokenizer from disk and probes the output
    /// dimension.
    ///
    /// # Errors
    /// - Model or tokenizer file missing or invalid
    /// - ONNX Runtime initialization fails
    /// - The probe inference yields an output that cannot be pooled
    pub fn new(
        model_id: impl Into<String>,
        paths: &ModelPaths,
        options: OnnxModelOptions,
    ) -> Result<Self, EmbeddingError> {
        let model_id = model_id.into();
        let started = Instant::now();

        if !paths.model.exists() {
            return Err(EmbeddingError::ModelNotFound(paths.model.display().to_string()));
        }
        if !paths.tokenizer.exists() {
            return Err(EmbeddingError::ModelNotFound(
                paths.tokenizer.display().to_string(),
            ));
        }

        let session = build_session(&paths.model, options.intra_threads)?;
        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer =
            Tokenizer::from_file(&paths.tokenizer).map_err(EmbeddingError::tokenizer)?;
        let pad_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);
        // Padding is done per batch below
        tokenizer.with_padding(None);
        let truncation = apply_truncation(&mut tokenizer, options.max_length)?;
        if truncation.is_none() {
            warn!(
                model = %model_id,
                "⚠️  Tokenizer has no truncation limit; long inputs may exceed the model's positions"
            );
        }

        let mut model = Self {
            session: Mutex::new(session),
            tokenizer,
            model_id,
            dimension: 0,
            pad_id,
            uses_token_type_ids,
            options,
        };

        let probe = model.run_chunk(&[PROBE_TEXT.to_string()])?;
        let dimension = probe.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(EmbeddingError::UnexpectedOutput(
                "probe inference returned an empty embedding".to_string(),
            ));
        }
        model.dimension = dimension;

        info!(
            model = %model.model_id,
            dimension,
            pooling = %model.options.pooling,
            normalize = model.options.normalize,
            token_type_ids = uses_token_type_ids,
            truncation = ?truncation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "✅ ONNX embedding model loaded"
        );

        Ok(model)
    }

    /// Tokenizes, pads and runs one chunk of texts through the session
    fn run_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(EmbeddingError::tokenizer)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let batch = encodings.len();
        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut input_ids = Vec::with_capacity(batch * max_len);
        let mut attention_mask = Vec::with_capacity(batch * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding_needed = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(self.pad_id as i64).take(padding_needed));

            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding_needed));
        }

        let input_ids_array = Array2::from_shape_vec((batch, max_len), input_ids)?;
        let attention_mask_array = Array2::from_shape_vec((batch, max_len), attention_mask)?;

        let mut inputs: Vec<(&str, SessionInputValue<'_>)> = vec![
            (
                "input_ids",
                Value::from_array(input_ids_array)
                    .map_err(EmbeddingError::runtime)?
                    .into(),
            ),
            (
                "attention_mask",
                TensorRef::from_array_view(attention_mask_array.view())
                    .map_err(EmbeddingError::runtime)?
                    .into(),
            ),
        ];
        if self.uses_token_type_ids {
            let token_type_ids = Array2::<i64>::zeros((batch, max_len));
            inputs.push((
                "token_type_ids",
                Value::from_array(token_type_ids)
                    .map_err(EmbeddingError::runtime)?
                    .into(),
            ));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::Worker("session lock poisoned".to_string()))?;
        let outputs = session.run(inputs).map_err(EmbeddingError::runtime)?;

        // Index [0]: output names differ between exports
        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(EmbeddingError::runtime)?;

        let mask = attention_mask_array.as_slice().ok_or_else(|| {
            EmbeddingError::UnexpectedOutput("attention mask is not contiguous".to_string())
        })?;
        let mut embeddings = pool_batch(self.options.pooling, output, mask, batch)?;
        if self.options.normalize {
            for embedding in &mut embeddings {
                l2_normalize(embedding);
            }
        }

        Ok(embeddings)
    }
}

impl Embedder for OnnxEmbeddingModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.options.batch_size.max(1)) {
            debug!(chunk = chunk.len(), "Running embedding chunk");
            embeddings.extend(self.run_chunk(chunk)?);
        }

        for embedding in &embeddings {
            if embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
        }

        Ok(embeddings)
    }
}

/// Sets the tokenizer's truncation to the lower of its own limit and
/// `max_length`. Returns the limit in effect, if any.
fn apply_truncation(
    tokenizer: &mut Tokenizer,
    max_length: Option<usize>,
) -> Result<Option<usize>, EmbeddingError> {
    let existing = tokenizer.get_truncation().cloned();
    let limit = match (existing.as_ref().map(|t| t.max_length), max_length) {
        (Some(own), Some(cap)) => Some(own.min(cap)),
        (own, cap) => own.or(cap),
    };

    if let Some(limit) = limit {
        let params = TruncationParams {
            max_length: limit,
            ..existing.unwrap_or_default()
        };
        tokenizer
            .with_truncation(Some(params))
            .map_err(EmbeddingError::tokenizer)?;
    }

    Ok(limit)
}

#[cfg(not(feature = "cuda"))]
fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session, EmbeddingError> {
    info!("Initializing ONNX embedding model on CPU");
    session_with_provider(
        model_path,
        intra_threads,
        CPUExecutionProvider::default().build(),
    )
}

#[cfg(feature = "cuda")]
fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session, EmbeddingError> {
    use ort::execution_providers::CUDAExecutionProvider;
    use tracing::warn;

    info!("Attempting CUDA execution provider...");
    match session_with_provider(
        model_path,
        intra_threads,
        CUDAExecutionProvider::default().build(),
    ) {
        Ok(session) => {
            info!("✅ CUDA execution provider initialized");
            Ok(session)
        }
        Err(e) => {
            warn!("⚠️  CUDA execution provider failed: {}", e);
            warn!("   Falling back to CPU execution provider");
            session_with_provider(
                model_path,
                intra_threads,
                CPUExecutionProvider::default().build(),
            )
        }
    }
}

fn session_with_provider(
    model_path: &Path,
    intra_threads: usize,
    provider: ExecutionProviderDispatch,
) -> Result<Session, EmbeddingError> {
    Session::builder()
        .map_err(EmbeddingError::runtime)?
        .with_execution_providers([provider])
        .map_err(EmbeddingError::runtime)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(EmbeddingError::runtime)?
        .with_intra_threads(intra_threads)
        .map_err(EmbeddingError::runtime)?
        .commit_from_file(model_path)
        .map_err(|e| {
            EmbeddingError::Runtime(format!(
                "failed to load ONNX model from {}: {}",
                model_path.display(),
                e
            ))
        })
}
