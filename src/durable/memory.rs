//! In-process durable store.
//!
//! Backs the ephemeral server mode and the test suites. Call counters make
//! read bypass observable; the write-failure switch drives the
//! persistence-error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DurableStore;
use crate::error::{Result, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, String>>,
    reads: AtomicU64,
    writes: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// When enabled, every mutating call fails with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Reads a raw value without touching the counters.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.data.read().await.get(key).cloned()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Persistence(
                "memory store is rejecting writes".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.check_writable()?;
        self.data.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.data.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.check_writable()?;
        self.data.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();

        store.set("a", "1".to_string()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);

        // Removing again is fine
        store.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_counters() {
        let store = MemoryStore::new();

        store.set("a", "1".to_string()).await.unwrap();
        store.get("a").await.unwrap();
        store.get("b").await.unwrap();
        store.peek("a").await;

        assert_eq!(store.writes(), 1);
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);

        let result = store.set("a", "1".to_string()).await;
        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert_eq!(store.peek("a").await, None);

        store.set_fail_writes(false);
        assert!(store.set("a", "1".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_keys_and_clear() {
        let store = MemoryStore::new();
        store.set("a", "1".to_string()).await.unwrap();
        store.set("b", "2".to_string()).await.unwrap();

        let mut keys = store.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        store.clear().await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
    }
}
