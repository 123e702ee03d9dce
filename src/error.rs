//! Error types for the storage layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Store Error Enum ==
/// Unified error type for the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The durable store failed to read or write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A stored value could not be deserialized
    #[error("Corrupt data under key {key}: {source}")]
    CorruptData {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// An image capture arrived without its base64 payload
    #[error("Image data not found")]
    MissingImageData,

    /// A backup document could not be parsed or lacks its `data` field
    #[error("Malformed backup: {0}")]
    MalformedBackup(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Wraps any displayable durable-store failure.
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        StoreError::Persistence(err.to_string())
    }

    pub fn corrupt(key: &str, source: serde_json::Error) -> Self {
        StoreError::CorruptData {
            key: key.to_string(),
            source,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::CorruptData { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            StoreError::MissingImageData => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::MalformedBackup(_) => StatusCode::BAD_REQUEST,
            StoreError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the storage layer.
pub type Result<T> = std::result::Result<T, StoreError>;
