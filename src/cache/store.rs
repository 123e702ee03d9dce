//! Cache Store Module
//!
//! Read-through / write-through cache in front of the durable store. The
//! durable store is the system of record; memory only saves re-reading and
//! re-parsing hot keys.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, StorageInfo};
use crate::clock::{Clock, SystemClock};
use crate::durable::DurableStore;
use crate::error::{Result, StoreError};

#[derive(Debug, Default)]
struct Memory {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

// == Cache Store ==
/// Process-wide cache handle. Construct once and share it via `Arc`.
///
/// Every path that writes the durable store or repopulates memory from it
/// holds `writes`, so a slow read-through can never install a value older
/// than a concurrent `set`. Memory hits never take it.
pub struct CacheStore {
    durable: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    memory: RwLock<Memory>,
    writes: Mutex<()>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a cache over `durable` using the system clock.
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self::with_clock(durable, Arc::new(SystemClock))
    }

    pub fn with_clock(durable: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            durable,
            clock,
            memory: RwLock::new(Memory::default()),
            writes: Mutex::new(()),
        }
    }

    /// Current time as seen by this cache.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // == Set ==
    /// Writes `value` to the durable store, then replaces the memory entry.
    ///
    /// If the durable write fails, memory is left untouched and the error is
    /// returned.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_minutes` - Optional memory TTL in minutes
    pub async fn set<T>(&self, key: &str, value: &T, ttl_minutes: Option<u32>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|e| {
            StoreError::InvalidRequest(format!("cannot serialize value for {}: {}", key, e))
        })?;
        let text = value.to_string();

        let _writes = self.writes.lock().await;
        self.durable.set(key, text).await?;

        let entry = CacheEntry::new(value, self.clock.now(), ttl_minutes);
        self.memory
            .write()
            .await
            .entries
            .insert(key.to_string(), entry);

        debug!(key, ?ttl_minutes, "Stored value");
        Ok(())
    }

    // == Get ==
    /// Reads `key`, preferring a live memory entry.
    ///
    /// On a memory miss or an expired entry the durable store is consulted
    /// under the write gate and a hit is cached with no expiry. Returns
    /// `Ok(None)` when the key is stored nowhere. Unparsable stored data
    /// fails with `CorruptData` and is not cached.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let now = self.clock.now();

        {
            let mut memory = self.memory.write().await;
            match memory.entries.get(key) {
                Some(entry) if entry.is_live(now) => {
                    let value = entry.value.clone();
                    memory.stats.record_hit();
                    drop(memory);
                    debug!(key, "Memory hit");
                    return serde_json::from_value(value)
                        .map(Some)
                        .map_err(|e| StoreError::corrupt(key, e));
                }
                Some(_) => {
                    memory.entries.remove(key);
                    debug!(key, "Evicted expired entry");
                }
                None => {}
            }
            memory.stats.record_miss();
        }

        let _writes = self.writes.lock().await;
        let Some(text) = self.durable.get(key).await? else {
            debug!(key, "Durable miss");
            return Ok(None);
        };

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            warn!(key, error = %e, "Stored value is not valid JSON");
            StoreError::corrupt(key, e)
        })?;
        let typed: T = serde_json::from_value(value.clone()).map_err(|e| {
            warn!(key, error = %e, "Stored value has an unexpected shape");
            StoreError::corrupt(key, e)
        })?;

        self.memory
            .write()
            .await
            .entries
            .insert(key.to_string(), CacheEntry::new(value, self.clock.now(), None));

        debug!(key, "Durable hit, cached");
        Ok(Some(typed))
    }

    /// Like [`get`](Self::get), substituting `default` on a miss.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    // == Remove ==
    /// Deletes `key` from the durable store and memory. Absent keys are fine.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let _writes = self.writes.lock().await;
        self.durable.remove(key).await?;
        self.memory.write().await.entries.remove(key);
        debug!(key, "Removed value");
        Ok(())
    }

    // == Clear All ==
    /// Wipes the durable store and the memory cache. Irreversible.
    pub async fn clear_all(&self) -> Result<()> {
        let _writes = self.writes.lock().await;
        self.durable.clear().await?;
        self.memory.write().await.entries.clear();
        warn!("All stored data cleared");
        Ok(())
    }

    // == Clear Memory ==
    /// Drops every memory entry; the durable store is untouched.
    pub async fn clear_memory_cache(&self) {
        let mut memory = self.memory.write().await;
        let dropped = memory.entries.len();
        memory.entries.clear();
        debug!(dropped, "Memory cache cleared");
    }

    // == Storage Info ==
    /// Counts live memory entries and durable keys.
    ///
    /// Expired entries are skipped in `cache_size` but stay in memory until
    /// the next read of their key.
    pub async fn storage_info(&self) -> Result<StorageInfo> {
        let total_keys = self.durable.list_keys().await?.len();
        let now = self.clock.now();

        let memory = self.memory.read().await;
        let cache_size = memory
            .entries
            .values()
            .filter(|entry| entry.is_live(now))
            .count();
        let last_access: BTreeMap<String, DateTime<Utc>> = memory
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.written_at))
            .collect();

        Ok(StorageInfo {
            cache_size,
            total_keys,
            last_access,
            hits: memory.stats.hits,
            misses: memory.stats.misses,
            hit_rate: memory.stats.hit_rate(),
        })
    }

    /// Number of memory entries, expired ones included.
    pub async fn memory_len(&self) -> usize {
        self.memory.read().await.entries.len()
    }
}
