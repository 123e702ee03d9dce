//! Response DTOs for the service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::images::{image_source, PLACEHOLDER_IMAGE};

/// Response body for a saved profile image (POST /users/:user_id/profile-image)
#[derive(Debug, Clone, Serialize)]
pub struct SavedImageResponse {
    /// Inline data URI, renderable without another round trip
    pub uri: String,
}

/// Response body for GET /users/:user_id/profile-image
#[derive(Debug, Clone, Serialize)]
pub struct ProfileImageResponse {
    /// Renderable reference
    pub uri: String,
    /// True when `uri` is the fallback placeholder
    pub placeholder: bool,
}

impl ProfileImageResponse {
    /// Resolves a stored reference, falling back to the placeholder.
    pub fn resolve(stored: Option<&str>) -> Self {
        let uri = image_source(stored);
        Self {
            placeholder: uri == PLACEHOLDER_IMAGE,
            uri: uri.to_string(),
        }
    }
}

/// Response body for POST /users/:user_id/profile-image/cleanup
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub user_id: String,
    /// Number of image records deleted
    pub removed: usize,
}

/// Plain acknowledgement for operations with nothing to return
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
