// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::embeddings::EmbeddingError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Body is not valid JSON
    InvalidRequest(String),
    /// Body is JSON but has missing or wrong-typed fields
    UnprocessableEntity(String),
    UnsupportedMediaType(String),
    PayloadTooLarge(String),
    /// Model invocation failed
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg),
            ApiError::UnprocessableEntity(msg) => ("invalid_request", msg),
            ApiError::UnsupportedMediaType(msg) => ("unsupported_media_type", msg),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg),
            ApiError::InternalError(msg) => ("internal_error", msg),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message: message.clone(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::UnprocessableEntity(_) => 422,
            ApiError::UnsupportedMediaType(_) => 415,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalError(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::UnprocessableEntity(msg) => write!(f, "Unprocessable entity: {}", msg),
            ApiError::UnsupportedMediaType(msg) => write!(f, "Unsupported media type: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => ApiError::UnprocessableEntity(message),
            JsonRejection::JsonSyntaxError(_) => ApiError::InvalidRequest(message),
            JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedMediaType(message),
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::PayloadTooLarge(message)
            }
            _ => ApiError::InvalidRequest(message),
        }
    }
}

impl From<EmbeddingError> for ApiError {
    fn from(err: EmbeddingError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
