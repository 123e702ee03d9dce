//! Typed access to the app settings record.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::error::{Result, StoreError};
use crate::keys;

// == Settings Record ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// The app configuration record.
///
/// Fields missing from a stored record fall back to the defaults; fields
/// this type does not know about are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub notifications: bool,
    pub auto_backup: bool,
    pub theme: Theme,
    pub language: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            auto_backup: true,
            theme: Theme::Light,
            language: "pt-BR".to_string(),
            extra: Map::new(),
        }
    }
}

// == Settings Patch ==
/// A partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Settings {
    /// Shallow merge, patch wins.
    pub fn merged(mut self, patch: SettingsPatch) -> Self {
        if let Some(notifications) = patch.notifications {
            self.notifications = notifications;
        }
        if let Some(auto_backup) = patch.auto_backup {
            self.auto_backup = auto_backup;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(language) = patch.language {
            self.language = language;
        }
        self
    }
}

// == Settings Store ==
pub struct SettingsStore {
    cache: Arc<CacheStore>,
}

impl SettingsStore {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }

    /// Stored settings, or the defaults on first use.
    ///
    /// An unreadable record also yields the defaults; only durable-store
    /// failures are surfaced.
    pub async fn get_settings(&self) -> Result<Settings> {
        match self
            .cache
            .get_or(keys::APP_SETTINGS, Settings::default())
            .await
        {
            Err(err @ StoreError::CorruptData { .. }) => {
                warn!(error = %err, "Stored settings unreadable, using defaults");
                Ok(Settings::default())
            }
            other => other,
        }
    }

    /// Read-modify-write of the settings record. Last write wins.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        let updated = self.get_settings().await?.merged(patch);
        self.cache.set(keys::APP_SETTINGS, &updated, None).await?;
        info!(theme = ?updated.theme, language = %updated.language, "Settings updated");
        Ok(updated)
    }
}
