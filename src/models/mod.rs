//! Response models for the service API
//!
//! Request bodies reuse the core types directly (`SettingsPatch`,
//! `ImageResult`, raw backup text); this module only holds the response
//! envelopes that have no core counterpart.

pub mod responses;

// Re-export commonly used types
pub use responses::{
    CleanupResponse, ErrorResponse, HealthResponse, MessageResponse, ProfileImageResponse,
    SavedImageResponse,
};
