// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use embedding_gateway::{
    api::{create_router, serve, shutdown_signal, AppState, ServerConfig},
    config::GatewayConfig,
    embeddings::OnnxEmbeddingModel,
    version,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = GatewayConfig::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting {}", version::get_version_string());

    if let Err(e) = config.validate() {
        error!("❌ {}", e);
        std::process::exit(2);
    }

    info!(
        model = %config.model,
        model_dir = ?config.model_dir,
        pooling = %config.pooling,
        normalize = config.normalize,
        batch_size = config.batch_size,
        "🧠 Loading embedding model..."
    );

    // Nothing is bound until the model is loaded
    let started = Instant::now();
    let model_id = config.model.clone();
    let source = config.model_source();
    let options = config.model_options();
    let loaded = tokio::task::spawn_blocking(move || {
        OnnxEmbeddingModel::load(model_id, &source, options)
    })
    .await
    .context("model loading task panicked")?;

    let model = match loaded {
        Ok(model) => model,
        Err(e) => {
            error!("❌ Failed to load embedding model {}: {}", config.model, e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(Arc::new(model));
    info!(
        model = %state.model_id(),
        dimension = state.dimension(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "✅ Embedding model ready"
    );

    let router = create_router(
        state,
        &ServerConfig {
            max_body_bytes: config.max_body_bytes,
        },
    );

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;

    serve(listener, router, shutdown_signal()).await?;

    info!("👋 Goodbye!");
    Ok(())
}
