//! Cache Module
//!
//! In-memory read-through cache with TTL expiry over a durable store.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::{CacheStats, StorageInfo};
pub use store::CacheStore;
