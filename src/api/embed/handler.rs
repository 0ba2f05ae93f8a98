// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed and POST /embed/bulk HTTP handlers
//!
//! Bodies are parsed before the model is touched; a malformed body is a
//! client error and never reaches inference. Inference runs on the blocking
//! pool through [`AppState::run_inference`].

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::debug;

use crate::api::embed::{BulkEmbedRequest, BulkEmbedResponse, EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use crate::embeddings::Embedder;

/// POST /embed handler
///
/// # Request Body
/// ```json
/// { "text": "Hello world" }
/// ```
///
/// # Response Body
/// ```json
/// { "embedding": [0.1, 0.2, ...] }
/// ```
pub async fn embed_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let Json(request) = payload?;

    debug!(bytes = request.text.len(), "Embedding single text");
    let embedding = state
        .run_inference(move |model: &dyn Embedder| model.embed(&request.text))
        .await?;

    Ok(Json(EmbedResponse { embedding }))
}

/// POST /embed/bulk handler
///
/// # Request Body
/// ```json
/// { "texts": ["first", "second"] }
/// ```
///
/// # Response Body
/// ```json
/// { "embeddings": [[0.1, ...], [0.2, ...]] }
/// ```
///
/// The whole batch succeeds or fails; no partial results are returned.
pub async fn bulk_embed_handler(
    State(state): State<AppState>,
    payload: Result<Json<BulkEmbedRequest>, JsonRejection>,
) -> Result<Json<BulkEmbedResponse>, ApiError> {
    let Json(request) = payload?;

    if request.texts.is_empty() {
        return Ok(Json(BulkEmbedResponse { embeddings: vec![] }));
    }

    let count = request.texts.len();
    debug!(count, "Embedding batch");
    let embeddings = state
        .run_inference(move |model: &dyn Embedder| model.embed_batch(&request.texts))
        .await?;

    if embeddings.len() != count {
        return Err(ApiError::InternalError(format!(
            "model returned {} embeddings for {} texts",
            embeddings.len(),
            count
        )));
    }

    let response = BulkEmbedResponse { embeddings };
    debug!(
        count = response.embedding_count(),
        floats = response.total_dimensions(),
        "Batch embedded"
    );
    Ok(Json(response))
}
