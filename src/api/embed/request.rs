// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request bodies for POST /embed and POST /embed/bulk

use serde::{Deserialize, Serialize};

/// Request body for POST /embed
///
/// ```json
/// { "text": "Hello world" }
/// ```
///
/// Empty strings are passed through to the model unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
}

/// Request body for POST /embed/bulk
///
/// ```json
/// { "texts": ["first", "second"] }
/// ```
///
/// An empty list is valid and yields an empty result. No size cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkEmbedRequest {
    pub texts: Vec<String>,
}
