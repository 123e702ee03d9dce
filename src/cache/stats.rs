//! Cache Statistics Module
//!
//! Tracks memory hits and misses, and the storage snapshot reported to
//! callers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Counters for the in-memory layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads answered from memory
    pub hits: u64,
    /// Reads that fell through to the durable store
    pub misses: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }
}

// == Storage Info ==
/// Point-in-time view of the memory cache and the durable store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    /// Live memory entries at call time
    pub cache_size: usize,
    /// Every key in the durable store, live or not
    pub total_keys: usize,
    /// Write time of each memory entry
    pub last_access: BTreeMap<String, DateTime<Utc>>,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
