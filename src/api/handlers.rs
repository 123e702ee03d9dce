//! API Handlers
//!
//! HTTP request handlers, one per storage operation.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::warn;

use crate::backup::BackupEngine;
use crate::cache::{CacheStore, StorageInfo};
use crate::config::{Config, StoreBackend};
use crate::durable::{DurableStore, FileStore, MemoryStore};
use crate::error::{Result, StoreError};
use crate::images::{ImageResult, ImageStore};
use crate::models::{
    CleanupResponse, HealthResponse, MessageResponse, ProfileImageResponse, SavedImageResponse,
};
use crate::settings::{Settings, SettingsPatch, SettingsStore};
use crate::statistics::{DoctorStatistics, Statistics, StatisticsService};

/// Application state shared across all handlers.
///
/// Every component holds the same `CacheStore`, so there is exactly one
/// memory cache per process.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheStore>,
    pub settings: Arc<SettingsStore>,
    pub backups: Arc<BackupEngine>,
    pub statistics: Arc<StatisticsService>,
    pub images: Arc<ImageStore>,
}

impl AppState {
    /// Wires every component to the given cache.
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self {
            settings: Arc::new(SettingsStore::new(cache.clone())),
            backups: Arc::new(BackupEngine::new(cache.clone())),
            statistics: Arc::new(StatisticsService::new(cache.clone())),
            images: Arc::new(ImageStore::new(cache.clone())),
            cache,
        }
    }

    /// Opens the configured durable backend and builds the state on top.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let durable: Arc<dyn DurableStore> = match config.backend {
            StoreBackend::File => Arc::new(FileStore::open(&config.store_path).await?),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(Self::new(Arc::new(CacheStore::new(durable))))
    }
}

fn require_id(id: &str, what: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidRequest(format!("{} cannot be empty", what)));
    }
    Ok(())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /settings
pub async fn get_settings_handler(State(state): State<AppState>) -> Result<Json<Settings>> {
    Ok(Json(state.settings.get_settings().await?))
}

/// Handler for PATCH /settings
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Settings>> {
    Ok(Json(state.settings.update_settings(patch).await?))
}

/// Handler for GET /backup
///
/// Returns the backup document text as-is so clients can share it verbatim.
pub async fn backup_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let document = state.backups.create_backup().await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], document))
}

/// Handler for POST /restore
pub async fn restore_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<MessageResponse>> {
    state.backups.restore(&body).await?;
    Ok(Json(MessageResponse::new("Backup restored")))
}

/// Handler for GET /statistics
pub async fn statistics_handler(State(state): State<AppState>) -> Json<Statistics> {
    Json(state.statistics.general_statistics().await)
}

/// Handler for GET /statistics/doctors/:doctor_id
pub async fn doctor_statistics_handler(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
) -> Json<DoctorStatistics> {
    Json(state.statistics.doctor_statistics(&doctor_id).await)
}

/// Handler for GET /storage/info
pub async fn storage_info_handler(State(state): State<AppState>) -> Result<Json<StorageInfo>> {
    Ok(Json(state.cache.storage_info().await?))
}

/// Handler for POST /storage/cache/clear
///
/// Drops the memory cache only; stored data is kept.
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.clear_memory_cache().await;
    Json(MessageResponse::new("Cache cleared"))
}

/// Handler for DELETE /storage
///
/// Erases all stored data.
pub async fn clear_all_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.cache.clear_all().await?;
    Ok(Json(MessageResponse::new("All data cleared")))
}

/// Handler for POST /users/:user_id/profile-image
pub async fn save_profile_image_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(image): Json<ImageResult>,
) -> Result<Json<SavedImageResponse>> {
    require_id(&user_id, "User id")?;
    let uri = state.images.save_profile_image(&user_id, &image).await?;
    Ok(Json(SavedImageResponse { uri }))
}

/// Handler for GET /users/:user_id/profile-image
///
/// Answers with the placeholder when the user has no image or the newest
/// record is unreadable. Durable-store failures are still errors.
pub async fn get_profile_image_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileImageResponse>> {
    require_id(&user_id, "User id")?;
    let stored = match state.images.get_user_profile_image(&user_id).await {
        Err(err @ StoreError::CorruptData { .. }) => {
            warn!(user_id = %user_id, error = %err, "Unreadable profile image, using placeholder");
            None
        }
        other => other?,
    };
    Ok(Json(ProfileImageResponse::resolve(stored.as_deref())))
}

/// Handler for POST /users/:user_id/profile-image/cleanup
pub async fn cleanup_images_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<CleanupResponse>> {
    require_id(&user_id, "User id")?;
    let removed = state.images.cleanup_old_images(&user_id).await?;
    Ok(Json(CleanupResponse { user_id, removed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use serde_json::json;

    fn memory_state() -> AppState {
        AppState::new(Arc::new(CacheStore::new(Arc::new(MemoryStore::new()))))
    }

    #[tokio::test]
    async fn test_settings_handlers() {
        let state = memory_state();

        let response = get_settings_handler(State(state.clone())).await.unwrap();
        assert_eq!(response.language, "pt-BR");

        let patch = SettingsPatch {
            language: Some("en-US".to_string()),
            ..Default::default()
        };
        update_settings_handler(State(state.clone()), Json(patch))
            .await
            .unwrap();

        let response = get_settings_handler(State(state)).await.unwrap();
        assert_eq!(response.language, "en-US");
    }

    #[tokio::test]
    async fn test_restore_handler_rejects_garbage() {
        let state = memory_state();

        let result = restore_handler(State(state), "garbage".to_string()).await;
        assert!(matches!(result, Err(StoreError::MalformedBackup(_))));
    }

    #[tokio::test]
    async fn test_statistics_handler() {
        let state = memory_state();
        state
            .cache
            .set(keys::APPOINTMENTS, &json!([{"status": "confirmed"}]), None)
            .await
            .unwrap();

        let response = statistics_handler(State(state)).await;
        assert_eq!(response.total_appointments, 1);
        assert_eq!(response.confirmed_appointments, 1);
    }

    #[tokio::test]
    async fn test_profile_image_handlers() {
        let state = memory_state();

        let response = get_profile_image_handler(State(state.clone()), Path("u1".to_string()))
            .await
            .unwrap();
        assert!(response.placeholder);

        let image = ImageResult {
            uri: "file:///a.jpg".to_string(),
            base64_payload: Some("QQ==".to_string()),
            width: 10,
            height: 10,
            file_size: None,
        };
        save_profile_image_handler(State(state.clone()), Path("u1".to_string()), Json(image))
            .await
            .unwrap();

        let response = get_profile_image_handler(State(state), Path("u1".to_string()))
            .await
            .unwrap();
        assert!(!response.placeholder);
        assert_eq!(response.uri, "data:image/jpeg;base64,QQ==");
    }

    #[tokio::test]
    async fn test_corrupt_profile_image_falls_back_to_placeholder() {
        let state = memory_state();
        state
            .cache
            .set(&keys::user_images("u1"), &json!(["profile_u1_1"]), None)
            .await
            .unwrap();
        state
            .cache
            .set(&keys::profile_image("profile_u1_1"), &json!("garbage"), None)
            .await
            .unwrap();

        let response = get_profile_image_handler(State(state), Path("u1".to_string()))
            .await
            .unwrap();
        assert!(response.placeholder);
        assert_eq!(response.uri, crate::images::PLACEHOLDER_IMAGE);
    }

    #[tokio::test]
    async fn test_blank_user_id_is_rejected() {
        let state = memory_state();

        let result = cleanup_images_handler(State(state), Path("  ".to_string())).await;
        assert!(matches!(result, Err(StoreError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_clear_cache_keeps_data() {
        let state = memory_state();
        state.cache.set(keys::TOKEN, "t", None).await.unwrap();

        clear_cache_handler(State(state.clone())).await;

        let info = storage_info_handler(State(state)).await.unwrap();
        assert_eq!(info.cache_size, 0);
        assert_eq!(info.total_keys, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
