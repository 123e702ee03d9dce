//! MedApp Store - client-side storage layer for the appointments app
//!
//! A process-wide read-through cache over a durable key-value store, with
//! typed settings, backup/restore, dashboard statistics and bounded
//! profile image retention built on top.

pub mod api;
pub mod backup;
pub mod cache;
pub mod clock;
pub mod config;
pub mod durable;
pub mod error;
pub mod images;
pub mod keys;
pub mod models;
pub mod settings;
pub mod statistics;

pub use api::AppState;
pub use backup::{BackupDocument, BackupEngine};
pub use cache::{CacheStore, StorageInfo};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use durable::{DurableStore, FileStore, MemoryStore};
pub use error::{Result, StoreError};
pub use images::{ImageResult, ImageStore};
pub use settings::{Settings, SettingsPatch, SettingsStore};
pub use statistics::{DoctorStatistics, Statistics, StatisticsService};
