// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;
pub mod version;

pub use api::{create_router, AppState, ServerConfig};
pub use config::{ConfigError, GatewayConfig};
pub use embeddings::{Embedder, EmbeddingError, OnnxEmbeddingModel, OnnxModelOptions};
