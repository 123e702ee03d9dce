//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    backup_handler, cleanup_images_handler, clear_all_handler, clear_cache_handler,
    doctor_statistics_handler, get_profile_image_handler, get_settings_handler, health_handler,
    restore_handler, save_profile_image_handler, statistics_handler, storage_info_handler,
    update_settings_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (the clients are local screens)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/settings",
            get(get_settings_handler).patch(update_settings_handler),
        )
        .route("/backup", get(backup_handler))
        .route("/restore", post(restore_handler))
        .route("/statistics", get(statistics_handler))
        .route(
            "/statistics/doctors/:doctor_id",
            get(doctor_statistics_handler),
        )
        .route("/storage", delete(clear_all_handler))
        .route("/storage/info", get(storage_info_handler))
        .route("/storage/cache/clear", post(clear_cache_handler))
        .route(
            "/users/:user_id/profile-image",
            get(get_profile_image_handler).post(save_profile_image_handler),
        )
        .route(
            "/users/:user_id/profile-image/cleanup",
            post(cleanup_images_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::durable::MemoryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let cache = Arc::new(CacheStore::new(Arc::new(MemoryStore::new())));
        create_router(AppState::new(cache))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_storage_info_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/storage/info")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_restore_malformed_is_bad_request() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/restore")
                    .body(Body::from("{\"nope\":true}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_save_image_without_payload_is_unprocessable() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users/u1/profile-image")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"uri":"file:///a.jpg","width":1,"height":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
