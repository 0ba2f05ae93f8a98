// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! HTTP server: shared state, router and serve loop.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::embed::{bulk_embed_handler, embed_handler};
use crate::api::handlers::health_handler;
use crate::api::ApiError;
use crate::embeddings::{Embedder, EmbeddingError};

/// State shared by all handlers.
///
/// Built from an already loaded model, so holding an `AppState` means the
/// gateway is ready to serve.
#[derive(Clone)]
pub struct AppState {
    model: Arc<dyn Embedder>,
}

impl AppState {
    pub fn new(model: Arc<dyn Embedder>) -> Self {
        Self { model }
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Runs `f` against the model on the blocking thread pool.
    ///
    /// Inference failures and worker panics become [`ApiError::InternalError`].
    pub async fn run_inference<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&dyn Embedder) -> Result<T, EmbeddingError> + Send + 'static,
        T: Send + 'static,
    {
        let model = Arc::clone(&self.model);
        let result = tokio::task::spawn_blocking(move || f(model.as_ref()))
            .await
            .unwrap_or_else(|e| Err(EmbeddingError::Worker(e.to_string())));

        result.map_err(|e| {
            error!(model = %self.model_id(), "Inference failed: {}", e);
            ApiError::from(e)
        })
    }
}

/// HTTP layer settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_body_bytes: usize,
}

pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/embed", post(embed_handler))
        .route("/embed/bulk", post(bulk_embed_handler))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves `router` on `listener` until `shutdown` resolves
pub async fn serve<S>(listener: TcpListener, router: Router, shutdown: S) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("API server listening on {}", addr);
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("⏹️  Shutdown signal received");
}
