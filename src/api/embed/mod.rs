// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! POST /embed (single text) and POST /embed/bulk (ordered list of texts).

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{bulk_embed_handler, embed_handler};
pub use request::{BulkEmbedRequest, EmbedRequest};
pub use response::{BulkEmbedResponse, EmbedResponse};
