//! Profile image storage with a bounded per-user history.
//!
//! Each saved image is its own record under `profileImage:<id>`. A user's
//! index under `userImages:<userId>` lists record IDs newest first and never
//! holds more than [`MAX_IMAGES_PER_USER`] entries once a save or cleanup
//! completes. Records that fall off the index are deleted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::error::{Result, StoreError};
use crate::keys;

// == Constants ==
/// Retention bound per user.
pub const MAX_IMAGES_PER_USER: usize = 5;

/// Shown whenever no usable image reference exists.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150/6366f1/ffffff?text=Avatar";

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

// == Image Types ==
/// What the image picker or camera hands over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub uri: String,
    #[serde(default, rename = "base64", alias = "base64Payload")]
    pub base64_payload: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub created_at: String,
}

/// A stored profile image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageRecord {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "base64")]
    pub base64_payload: String,
    #[serde(rename = "uri")]
    pub source_uri: String,
    pub metadata: ImageMetadata,
}

impl ProfileImageRecord {
    pub fn data_uri(&self) -> String {
        to_data_uri(&self.base64_payload)
    }
}

fn to_data_uri(payload: &str) -> String {
    format!("{}{}", DATA_URI_PREFIX, payload)
}

// == URI Helpers ==
/// True for references an image view can render: inline data, device
/// file or content URIs, and HTTPS.
pub fn validate_image_uri(uri: &str) -> bool {
    ["data:image/", "file://", "content://", "https://"]
        .iter()
        .any(|prefix| uri.starts_with(prefix))
}

pub fn placeholder_image() -> &'static str {
    PLACEHOLDER_IMAGE
}

/// The reference to render: `stored` if it validates, else the placeholder.
pub fn image_source(stored: Option<&str>) -> &str {
    match stored {
        Some(uri) if validate_image_uri(uri) => uri,
        _ => PLACEHOLDER_IMAGE,
    }
}

// == Image Store ==
pub struct ImageStore {
    cache: Arc<CacheStore>,
    // Last millisecond stamp issued per user, so IDs never repeat.
    last_issued: Mutex<HashMap<String, i64>>,
}

impl ImageStore {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self {
            cache,
            last_issued: Mutex::new(HashMap::new()),
        }
    }

    /// `profile_<userId>_<millis>`, bumped past the previous stamp when the
    /// clock has not advanced.
    fn next_image_id(&self, user_id: &str) -> String {
        let now = self.cache.now().timestamp_millis();
        let mut issued = self.last_issued.lock().unwrap_or_else(|e| e.into_inner());
        let stamp = match issued.get(user_id) {
            Some(&last) if now <= last => last + 1,
            _ => now,
        };
        issued.insert(user_id.to_string(), stamp);
        format!("profile_{}_{}", user_id, stamp)
    }

    async fn index(&self, user_id: &str) -> Result<Vec<String>> {
        self.cache.get_or(&keys::user_images(user_id), Vec::new()).await
    }

    async fn delete_records(&self, image_ids: &[String]) -> Result<()> {
        for image_id in image_ids {
            self.cache.remove(&keys::profile_image(image_id)).await?;
        }
        Ok(())
    }

    // == Save ==
    /// Stores a new profile image and returns it as an inline data URI.
    ///
    /// Fails with `MissingImageData` before any write if the capture has no
    /// payload.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the image
    /// * `image` - The capture; `base64_payload` is required
    pub async fn save_profile_image(&self, user_id: &str, image: &ImageResult) -> Result<String> {
        let payload = image
            .base64_payload
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(StoreError::MissingImageData)?;

        let image_id = self.next_image_id(user_id);
        let record = ProfileImageRecord {
            id: image_id.clone(),
            user_id: user_id.to_string(),
            base64_payload: payload.to_string(),
            source_uri: image.uri.clone(),
            metadata: ImageMetadata {
                width: image.width,
                height: image.height,
                file_size: image.file_size,
                created_at: self.cache.now().to_rfc3339(),
            },
        };
        self.cache
            .set(&keys::profile_image(&image_id), &record, None)
            .await?;

        let mut index = self.index(user_id).await?;
        index.insert(0, image_id.clone());
        let dropped = if index.len() > MAX_IMAGES_PER_USER {
            index.split_off(MAX_IMAGES_PER_USER)
        } else {
            Vec::new()
        };
        self.cache
            .set(&keys::user_images(user_id), &index, None)
            .await?;
        self.delete_records(&dropped).await?;

        info!(user_id, image_id = %image_id, dropped = dropped.len(), "Profile image saved");
        Ok(to_data_uri(payload))
    }

    // == Cleanup ==
    /// Deletes records beyond the retention bound and truncates the index.
    ///
    /// Returns how many records were removed.
    pub async fn cleanup_old_images(&self, user_id: &str) -> Result<usize> {
        let mut index = self.index(user_id).await?;
        if index.len() <= MAX_IMAGES_PER_USER {
            debug!(user_id, kept = index.len(), "No images to clean up");
            return Ok(0);
        }

        let stale = index.split_off(MAX_IMAGES_PER_USER);
        self.delete_records(&stale).await?;
        self.cache
            .set(&keys::user_images(user_id), &index, None)
            .await?;

        info!(user_id, removed = stale.len(), "Old profile images removed");
        Ok(stale.len())
    }

    // == Lookup ==
    /// The newest stored image as a data URI, if the user has one.
    pub async fn get_user_profile_image(&self, user_id: &str) -> Result<Option<String>> {
        let index = self.index(user_id).await?;
        let Some(latest) = index.first() else {
            return Ok(None);
        };

        let record: Option<ProfileImageRecord> =
            self.cache.get(&keys::profile_image(latest)).await?;
        Ok(record
            .filter(|r| !r.base64_payload.is_empty())
            .map(|r| r.data_uri()))
    }

    /// IDs in the user's index, newest first.
    pub async fn user_image_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.index(user_id).await
    }
}
