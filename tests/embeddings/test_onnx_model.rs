// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX model tests
//!
//! Tests marked #[ignore] need real model files. Point EMBEDDING_MODEL_DIR
//! at a directory holding model.onnx and tokenizer.json, then run:
//! cargo test --test embeddings_tests -- --ignored

use embedding_gateway::embeddings::{
    Embedder, EmbeddingError, ModelSource, OnnxEmbeddingModel, OnnxModelOptions, PoolingStrategy,
};
use std::path::PathBuf;
use tempfile::TempDir;

const TEST_MODEL_ID: &str = "local-test-model";

fn model_dir() -> PathBuf {
    std::env::var("EMBEDDING_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./models/bge-m3-onnx"))
}

fn load_model(options: OnnxModelOptions) -> OnnxEmbeddingModel {
    OnnxEmbeddingModel::load(
        TEST_MODEL_ID,
        &ModelSource::Local { dir: model_dir() },
        options,
    )
    .expect("model should load from EMBEDDING_MODEL_DIR")
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}

#[test]
fn test_load_from_empty_dir_fails() {
    let dir = TempDir::new().unwrap();

    let err = OnnxEmbeddingModel::load(
        TEST_MODEL_ID,
        &ModelSource::Local {
            dir: dir.path().to_path_buf(),
        },
        OnnxModelOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, EmbeddingError::ModelNotFound(_)));
}

#[test]
fn test_load_rejects_corrupt_model() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("model.onnx"), b"not an onnx graph").unwrap();
    std::fs::write(dir.path().join("tokenizer.json"), b"{}").unwrap();

    let result = OnnxEmbeddingModel::load(
        TEST_MODEL_ID,
        &ModelSource::Local {
            dir: dir.path().to_path_buf(),
        },
        OnnxModelOptions::default(),
    );

    assert!(result.is_err());
}

#[test]
#[ignore]
fn test_loaded_model_reports_dimension() {
    let model = load_model(OnnxModelOptions::default());

    assert_eq!(model.model_id(), TEST_MODEL_ID);
    assert!(model.dimension() > 0);
}

#[test]
#[ignore]
fn test_embed_is_deterministic_and_normalized() {
    let model = load_model(OnnxModelOptions::default());

    let first = model.embed("The quick brown fox").unwrap();
    let second = model.embed("The quick brown fox").unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), model.dimension());
    let norm: f32 = first.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-3, "norm was {}", norm);
}

#[test]
#[ignore]
fn test_empty_string_embeds() {
    let model = load_model(OnnxModelOptions::default());

    let embedding = model.embed("").unwrap();

    assert_eq!(embedding.len(), model.dimension());
}

#[test]
#[ignore]
fn test_batch_matches_single_across_chunks() {
    let model = load_model(OnnxModelOptions {
        batch_size: 2,
        ..OnnxModelOptions::default()
    });
    let texts: Vec<String> = vec![
        "short".to_string(),
        "a somewhat longer sentence that pads the others".to_string(),
        "machine learning".to_string(),
        "".to_string(),
        "the last one".to_string(),
    ];

    let batch = model.embed_batch(&texts).unwrap();

    assert_eq!(batch.len(), texts.len());
    for (text, embedding) in texts.iter().zip(&batch) {
        let single = model.embed(text).unwrap();
        let similarity = cosine_similarity(&single, embedding);
        assert!(
            similarity > 0.999,
            "padding changed the embedding of {:?}: {}",
            text,
            similarity
        );
    }
}

#[test]
#[ignore]
fn test_similar_texts_score_higher() {
    let model = load_model(OnnxModelOptions::default());

    let cat = model.embed("A cat sits on the mat").unwrap();
    let kitten = model.embed("A kitten is sitting on a rug").unwrap();
    let finance = model.embed("Quarterly revenue grew by eight percent").unwrap();

    assert!(cosine_similarity(&cat, &kitten) > cosine_similarity(&cat, &finance));
}

#[test]
#[ignore]
fn test_mean_pooling_without_normalization() {
    let model = load_model(OnnxModelOptions {
        pooling: PoolingStrategy::Mean,
        normalize: false,
        ..OnnxModelOptions::default()
    });

    let embedding = model.embed("mean pooled text").unwrap();

    assert_eq!(embedding.len(), model.dimension());
    assert!(embedding.iter().all(|x| x.is_finite()));
}
