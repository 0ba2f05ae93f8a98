// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model file resolution.
//!
//! The gateway needs an ONNX graph and a `tokenizer.json`. They come either
//! from a local directory or from the Hugging Face Hub cache (downloaded on
//! first use).

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::embeddings::EmbeddingError;

/// ONNX file name expected inside a local model directory
pub const LOCAL_MODEL_FILE: &str = "model.onnx";

/// Tokenizer file name, both locally and in the hub repo
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Where to find the model files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Directory containing `model.onnx` and `tokenizer.json`
    Local { dir: PathBuf },
    /// Hugging Face Hub repository
    Hub {
        repo_id: String,
        onnx_file: String,
        cache_dir: Option<PathBuf>,
    },
}

/// Resolved paths to the files the ONNX model needs
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

/// Resolves (and downloads if necessary) the model files
pub fn resolve_model_files(source: &ModelSource) -> Result<ModelPaths, EmbeddingError> {
    match source {
        ModelSource::Local { dir } => local_model_files(dir),
        ModelSource::Hub {
            repo_id,
            onnx_file,
            cache_dir,
        } => download_model_files(repo_id, onnx_file, cache_dir.as_deref()),
    }
}

fn local_model_files(dir: &Path) -> Result<ModelPaths, EmbeddingError> {
    let model = dir.join(LOCAL_MODEL_FILE);
    let tokenizer = dir.join(TOKENIZER_FILE);

    for path in [&model, &tokenizer] {
        if !path.exists() {
            return Err(EmbeddingError::ModelNotFound(path.display().to_string()));
        }
    }

    debug!(path = ?dir, "Using local model directory");
    Ok(ModelPaths { model, tokenizer })
}

fn download_model_files(
    repo_id: &str,
    onnx_file: &str,
    cache_dir: Option<&Path>,
) -> Result<ModelPaths, EmbeddingError> {
    use hf_hub::api::sync::ApiBuilder;

    let mut builder = ApiBuilder::new().with_progress(false);
    if let Some(dir) = cache_dir {
        builder = builder.with_cache_dir(dir.to_path_buf());
    }
    let api = builder
        .build()
        .map_err(|e| EmbeddingError::Download(e.to_string()))?;
    let repo = api.model(repo_id.to_string());

    info!(repo = %repo_id, file = %onnx_file, "Fetching model files");

    let model = repo
        .get(onnx_file)
        .map_err(|e| EmbeddingError::Download(format!("{}/{}: {}", repo_id, onnx_file, e)))?;

    // Graphs over 2 GB keep their weights in files next to the graph
    // (`model.onnx_data`); ONNX Runtime reads them from the same directory.
    match repo.info() {
        Ok(repo_info) => {
            let siblings: Vec<&str> = repo_info
                .siblings
                .iter()
                .map(|s| s.rfilename.as_str())
                .collect();
            for file in external_data_files(onnx_file, &siblings) {
                info!(repo = %repo_id, file = %file, "Fetching external weights");
                repo.get(&file)
                    .map_err(|e| EmbeddingError::Download(format!("{}/{}: {}", repo_id, file, e)))?;
            }
        }
        Err(e) => warn!(
            repo = %repo_id,
            "Could not list repository files, assuming a self-contained graph: {}",
            e
        ),
    }

    let tokenizer = repo
        .get(TOKENIZER_FILE)
        .map_err(|e| EmbeddingError::Download(format!("{}/{}: {}", repo_id, TOKENIZER_FILE, e)))?;

    debug!(model = ?model, tokenizer = ?tokenizer, "Model files cached");
    Ok(ModelPaths { model, tokenizer })
}

/// Repository files that belong to `onnx_file`: same directory, name starting
/// with the graph's file name (`model.onnx_data`, `model.onnx.data`, ...)
fn external_data_files(onnx_file: &str, siblings: &[&str]) -> Vec<String> {
    siblings
        .iter()
        .filter(|name| **name != onnx_file && name.starts_with(onnx_file))
        .filter(|name| !name[onnx_file.len()..].contains('/'))
        .map(|name| name.to_string())
        .collect()
}
