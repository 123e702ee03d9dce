//! On-disk durable store.
//!
//! The whole mapping lives in one JSON object document. Every mutation
//! rewrites it to a sibling temp file and renames it into place, so readers
//! never see a torn document.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::DurableStore;
use crate::error::{Result, StoreError};

type Document = BTreeMap<String, String>;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: RwLock<Document>,
}

impl FileStore {
    /// Opens the store at `path`, creating parent directories as needed.
    ///
    /// A missing file opens as an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Persistence(format!("{}: {}", parent.display(), e)))?;
        }

        let data = match fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Document::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                StoreError::Persistence(format!("unreadable store {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document::new(),
            Err(e) => {
                return Err(StoreError::Persistence(format!("{}: {}", path.display(), e)));
            }
        };

        info!(path = %path.display(), keys = data.len(), "File store opened");

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    async fn persist(&self, doc: &Document) -> Result<()> {
        let contents = serde_json::to_string_pretty(doc).map_err(StoreError::persistence)?;
        let tmp = self.path.with_extension("tmp");

        fs::write(&tmp, contents)
            .await
            .map_err(|e| StoreError::Persistence(format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Persistence(format!("{}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), keys = doc.len(), "File store persisted");
        Ok(())
    }

    /// Applies `change` to a copy of the document, persists it, then swaps
    /// it in. A failed write leaves the in-memory document untouched.
    async fn mutate(&self, change: impl FnOnce(&mut Document)) -> Result<()> {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        change(&mut next);
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.mutate(|doc| {
            doc.insert(key.to_string(), value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if !self.data.read().await.contains_key(key) {
            return Ok(());
        }
        self.mutate(|doc| {
            doc.remove(key);
        })
        .await
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.data.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.mutate(|doc| doc.clear()).await
    }
}
