// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Behaviour of the default `Embedder::embed` implementation

use embedding_gateway::embeddings::{Embedder, EmbeddingError};
use std::sync::Mutex;

/// Records the batches it receives and returns their lengths as vectors
struct RecordingEmbedder {
    batches: Mutex<Vec<Vec<String>>>,
}

impl Embedder for RecordingEmbedder {
    fn model_id(&self) -> &str {
        "recording"
    }

    fn dimension(&self) -> usize {
        2
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batches.lock().unwrap().push(texts.to_vec());
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, 1.0])
            .collect())
    }
}

/// Returns no vectors at all
struct EmptyEmbedder;

impl Embedder for EmptyEmbedder {
    fn model_id(&self) -> &str {
        "empty"
    }

    fn dimension(&self) -> usize {
        2
    }

    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(vec![])
    }
}

#[test]
fn test_embed_goes_through_batch_path() {
    let embedder = RecordingEmbedder {
        batches: Mutex::new(Vec::new()),
    };

    let vector = embedder.embed("hello").unwrap();

    assert_eq!(vector, vec![5.0, 1.0]);
    assert_eq!(
        *embedder.batches.lock().unwrap(),
        vec![vec!["hello".to_string()]]
    );
}

#[test]
fn test_embed_empty_batch_result_is_error() {
    let err = EmptyEmbedder.embed("hello").unwrap_err();
    assert!(matches!(err, EmbeddingError::UnexpectedOutput(_)));
}
