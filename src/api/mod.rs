// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod embed;
pub mod errors;
pub mod handlers;
pub mod http_server;

pub use embed::{
    bulk_embed_handler, embed_handler, BulkEmbedRequest, BulkEmbedResponse, EmbedRequest,
    EmbedResponse,
};
pub use errors::{ApiError, ErrorResponse};
pub use handlers::{health_handler, HealthResponse};
pub use http_server::{create_router, serve, shutdown_signal, AppState, ServerConfig};
