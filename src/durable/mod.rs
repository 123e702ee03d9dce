//! Durable Store Module
//!
//! The persistent key-value substrate underneath the cache layer. Values
//! crossing this boundary are always JSON text.

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Persistent string-to-string mapping.
///
/// Any failure is reported as [`StoreError::Persistence`](crate::error::StoreError::Persistence).
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn list_keys(&self) -> Result<Vec<String>>;
    async fn clear(&self) -> Result<()>;
}
