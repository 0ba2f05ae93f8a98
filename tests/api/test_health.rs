// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health tests

use super::common::*;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_health_reports_model() {
    let model = Arc::new(HashEmbedder::new(TEST_DIMENSION));
    let router = test_router(model.clone());

    let (status, body) = send(router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "model": TEST_MODEL}));
    assert_eq!(model.calls(), 0, "health must not run inference");
}

#[tokio::test]
async fn test_health_ok_even_when_inference_fails() {
    let router = test_router(Arc::new(FailingEmbedder));

    let (status, body) = send(router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let router = test_router(Arc::new(HashEmbedder::new(TEST_DIMENSION)));

    let (status, _) = send(router, get("/v1/embed")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
