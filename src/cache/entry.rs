//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

// == Cache Entry ==
/// Represents a single in-memory entry with its value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value, already parsed
    pub value: Value,
    /// When the entry was written into memory
    pub written_at: DateTime<Utc>,
    /// Expiration instant, None = valid until the next explicit write
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now` - Write time
    /// * `ttl_minutes` - Optional TTL in minutes; zero means no expiry
    pub fn new(value: Value, now: DateTime<Utc>, ttl_minutes: Option<u32>) -> Self {
        let expires_at = ttl_minutes
            .filter(|ttl| *ttl > 0)
            .map(|ttl| now + Duration::minutes(i64::from(ttl)));

        Self {
            value,
            written_at: now,
            expires_at,
        }
    }

    // == Is Live ==
    /// An entry is live while it has no expiry or `now` is before it.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now < expires,
            None => true,
        }
    }
}
