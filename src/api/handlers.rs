// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::http_server::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

/// GET /health
///
/// The router only exists once the model has loaded, so this is always "ok".
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model_id().to_string(),
    })
}
