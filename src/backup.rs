//! Backup and restore of the user-owned collections.
//!
//! A backup covers exactly four keys: appointments, notifications,
//! registered users and settings. The session keys (user, token) and the
//! statistics cache are never exported or overwritten.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::error::{Result, StoreError};
use crate::keys;

// == Backup Document ==
/// Portable snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    /// ISO-8601 generation time. Older exports may omit it; anything that
    /// is not a string is ignored.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_none"
    )]
    pub timestamp: Option<String>,
    pub data: BackupData,
}

/// The four exported collections, kept as raw JSON so nothing is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    #[serde(default = "empty_list", deserialize_with = "null_as_list")]
    pub appointments: Value,
    #[serde(default = "empty_list", deserialize_with = "null_as_list")]
    pub notifications: Value,
    #[serde(default = "empty_list", deserialize_with = "null_as_list")]
    pub registered_users: Value,
    #[serde(default = "empty_object", deserialize_with = "null_as_object")]
    pub settings: Value,
}

// == Field Defaults ==
fn empty_list() -> Value {
    json!([])
}

fn empty_object() -> Value {
    json!({})
}

fn string_or_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn null_as_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Value, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(if value.is_null() { empty_list() } else { value })
}

fn null_as_object<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Value, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(if value.is_null() { empty_object() } else { value })
}

impl BackupDocument {
    /// Parses an exported document.
    ///
    /// Fails with `MalformedBackup` if the text is not JSON or has no
    /// `data` object.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)
            .map_err(|e| StoreError::MalformedBackup(format!("not valid JSON: {}", e)))?;

        match raw.get("data") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(StoreError::MalformedBackup(
                    "`data` must be an object".to_string(),
                ))
            }
            None => {
                return Err(StoreError::MalformedBackup(
                    "missing `data` field".to_string(),
                ))
            }
        }

        serde_json::from_value(raw).map_err(|e| StoreError::MalformedBackup(e.to_string()))
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// == Backup Engine ==
pub struct BackupEngine {
    cache: Arc<CacheStore>,
}

impl BackupEngine {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }

    // == Create ==
    /// Snapshots the four collections. Reads only.
    pub async fn snapshot(&self) -> Result<BackupDocument> {
        let data = BackupData {
            appointments: self.cache.get_or(keys::APPOINTMENTS, empty_list()).await?,
            notifications: self.cache.get_or(keys::NOTIFICATIONS, empty_list()).await?,
            registered_users: self
                .cache
                .get_or(keys::REGISTERED_USERS, empty_list())
                .await?,
            settings: self.cache.get_or(keys::APP_SETTINGS, empty_object()).await?,
        };

        Ok(BackupDocument {
            timestamp: Some(iso_timestamp(self.cache.now())),
            data,
        })
    }

    /// Snapshot serialized as the portable text document.
    pub async fn create_backup(&self) -> Result<String> {
        let document = self.snapshot().await?;
        let text = serde_json::to_string(&document)
            .map_err(|e| StoreError::InvalidRequest(format!("cannot serialize backup: {}", e)))?;
        info!(bytes = text.len(), "Backup created");
        Ok(text)
    }

    // == Restore ==
    /// Replaces the four collections with the document's contents.
    ///
    /// The writes are independent: if one fails, the ones before it stay
    /// applied.
    ///
    /// # Arguments
    /// * `text` - A document produced by `create_backup`, or an older export
    ///   with only some of the collections
    pub async fn restore(&self, text: &str) -> Result<()> {
        let document = BackupDocument::parse(text)?;
        self.apply(&document.data).await?;
        info!(timestamp = ?document.timestamp, "Backup restored");
        Ok(())
    }

    async fn apply(&self, data: &BackupData) -> Result<()> {
        let writes: [(&str, &Value); 4] = [
            (keys::APPOINTMENTS, &data.appointments),
            (keys::NOTIFICATIONS, &data.notifications),
            (keys::REGISTERED_USERS, &data.registered_users),
            (keys::APP_SETTINGS, &data.settings),
        ];

        for (index, (key, value)) in writes.into_iter().enumerate() {
            if let Err(e) = self.cache.set(key, value, None).await {
                warn!(key, applied = index, "Restore stopped partway");
                return Err(e);
            }
        }
        Ok(())
    }
}
