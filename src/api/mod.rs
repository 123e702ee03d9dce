//! API Module
//!
//! HTTP handlers and routing that expose the storage layer to screen clients.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /settings`, `PATCH /settings` - Read and update app settings
//! - `GET /backup`, `POST /restore` - Export and import the backup document
//! - `GET /statistics`, `GET /statistics/doctors/:doctor_id` - Dashboard numbers
//! - `GET /storage/info`, `POST /storage/cache/clear`, `DELETE /storage` - Storage maintenance
//! - `POST|GET /users/:user_id/profile-image`, `POST /users/:user_id/profile-image/cleanup` - Profile images

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
