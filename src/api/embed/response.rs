// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response bodies for POST /embed and POST /embed/bulk

use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// ```json
/// { "embedding": [0.1, 0.2, ...] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
}

/// Response body for POST /embed/bulk, one vector per input text in order
///
/// ```json
/// { "embeddings": [[0.1, 0.2, ...], [0.3, 0.4, ...]] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkEmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
}

impl BulkEmbedResponse {
    /// Returns the number of embeddings in the response
    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns the total number of float values across all embeddings
    pub fn total_dimensions(&self) -> usize {
        self.embeddings.iter().map(Vec::len).sum()
    }
}
