// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Gateway configuration.
//!
//! Every option can be given as a flag or through the environment (a `.env`
//! file is loaded first by the binary).

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use thiserror::Error;

use crate::embeddings::{ModelSource, OnnxModelOptions, PoolingStrategy};

/// Model served when nothing else is configured
pub const DEFAULT_MODEL: &str = "BAAI/bge-m3";

/// ONNX graph location inside a hub repository
pub const DEFAULT_ONNX_FILE: &str = "onnx/model.onnx";

pub const DEFAULT_PORT: u16 = 8001;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Embedding gateway startup configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "embedding-gateway")]
#[command(version)]
#[command(about = "Serve a pretrained text-embedding model over HTTP", long_about = None)]
pub struct GatewayConfig {
    /// Model identifier (Hugging Face repo id), reported by /health
    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Local directory with model.onnx and tokenizer.json (skips download)
    #[arg(long, env = "EMBEDDING_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Path of the ONNX file inside the hub repository
    #[arg(long, env = "EMBEDDING_ONNX_FILE", default_value = DEFAULT_ONNX_FILE)]
    pub onnx_file: String,

    /// Hugging Face cache directory
    #[arg(long, env = "EMBEDDING_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Sentence pooling strategy
    #[arg(long, env = "EMBEDDING_POOLING", value_enum, default_value_t = PoolingStrategy::Cls)]
    pub pooling: PoolingStrategy,

    /// L2-normalize embeddings
    #[arg(long, env = "EMBEDDING_NORMALIZE", default_value_t = true, action = ArgAction::Set)]
    pub normalize: bool,

    /// Cap on tokens per text (the tokenizer's own limit applies if lower)
    #[arg(long, env = "EMBEDDING_MAX_LENGTH")]
    pub max_length: Option<usize>,

    /// Texts per inference run
    #[arg(long, env = "EMBEDDING_BATCH_SIZE", default_value_t = 32)]
    pub batch_size: usize,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "EMBEDDING_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 64 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model",
                message: "model identifier cannot be empty".to_string(),
            });
        }
        if self.model_dir.is_none() && self.onnx_file.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "onnx_file",
                message: "onnx file cannot be empty when downloading from the hub".to_string(),
            });
        }

        for (field, value) in [
            ("batch_size", self.batch_size),
            ("max_length", self.max_length.unwrap_or(1)),
            ("intra_threads", self.intra_threads),
            ("max_body_bytes", self.max_body_bytes),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: "must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Local directory wins over the hub
    pub fn model_source(&self) -> ModelSource {
        match &self.model_dir {
            Some(dir) => ModelSource::Local { dir: dir.clone() },
            None => ModelSource::Hub {
                repo_id: self.model.clone(),
                onnx_file: self.onnx_file.clone(),
                cache_dir: self.cache_dir.clone(),
            },
        }
    }

    pub fn model_options(&self) -> OnnxModelOptions {
        OnnxModelOptions {
            pooling: self.pooling,
            normalize: self.normalize,
            max_length: self.max_length,
            batch_size: self.batch_size,
            intra_threads: self.intra_threads,
        }
    }
}
