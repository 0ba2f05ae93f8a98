// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed/bulk tests

use super::common::*;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_bulk_returns_one_vector_per_text_in_order() {
    let model = Arc::new(HashEmbedder::new(TEST_DIMENSION));
    let router = test_router(model.clone());
    let texts = ["first", "second", "third"];

    let body = json!({ "texts": texts }).to_string();
    let (status, response) = send(router, post_json("/embed/bulk", &body)).await;

    assert_eq!(status, StatusCode::OK);
    let embeddings = response["embeddings"].as_array().unwrap();
    assert_eq!(embeddings.len(), texts.len());
    for (embedding, text) in embeddings.iter().zip(texts) {
        let vector = as_vector(embedding);
        assert_eq!(vector.len(), TEST_DIMENSION);
        assert_eq!(vector, model.vector_for(text), "order must follow input");
    }
}

#[tokio::test]
async fn test_bulk_empty_list_returns_empty_list() {
    let model = Arc::new(HashEmbedder::new(TEST_DIMENSION));
    let router = test_router(model.clone());

    let (status, response) = send(router, post_json("/embed/bulk", r#"{"texts": []}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({"embeddings": []}));
    assert_eq!(model.calls(), 0, "empty batch must not reach the model");
}

#[tokio::test]
async fn test_bulk_duplicates_get_identical_vectors() {
    let router = test_router(Arc::new(HashEmbedder::new(TEST_DIMENSION)));

    let (_, response) = send(
        router,
        post_json("/embed/bulk", r#"{"texts": ["dup", "other", "dup"]}"#),
    )
    .await;

    assert_eq!(response["embeddings"][0], response["embeddings"][2]);
    assert_ne!(response["embeddings"][0], response["embeddings"][1]);
}

#[tokio::test]
async fn test_bulk_large_batch() {
    let router = test_router(Arc::new(HashEmbedder::new(TEST_DIMENSION)));
    let texts: Vec<String> = (0..500).map(|i| format!("document number {}", i)).collect();

    let body = json!({ "texts": texts }).to_string();
    let (status, response) = send(router, post_json("/embed/bulk", &body)).await;

    assert_eq!(status, StatusCode::OK);
    let embeddings = response["embeddings"].as_array().unwrap();
    assert_eq!(embeddings.len(), 500);
    assert!(embeddings
        .iter()
        .all(|e| as_vector(e).len() == TEST_DIMENSION));
}

#[tokio::test]
async fn test_bulk_failure_returns_no_partial_results() {
    let router = test_router(Arc::new(FailingEmbedder));

    let (status, response) = send(
        router,
        post_json("/embed/bulk", r#"{"texts": ["a", "b"]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["error_type"], "internal_error");
    assert!(response.get("embeddings").is_none());
}

#[tokio::test]
async fn test_concurrent_requests_share_one_model() {
    let model = Arc::new(HashEmbedder::new(TEST_DIMENSION));
    let router = test_router(model.clone());

    let mut handles = Vec::new();
    for i in 0..16 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let body = json!({ "text": format!("text {}", i) }).to_string();
            send(router, post_json("/embed", &body)).await
        }));
    }

    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(model.calls(), 16);
}
