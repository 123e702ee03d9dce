//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Which durable backend the service writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSON document on disk
    File,
    /// Process-local map, lost on exit
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Some(StoreBackend::File),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Location of the on-disk store document
    pub store_path: PathBuf,
    /// Durable backend selection
    pub backend: StoreBackend,
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STORE_PATH: &str = "data/medapp_store.json";

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORE_PATH` - Store document path (default: data/medapp_store.json)
    /// - `STORE_BACKEND` - `file` or `memory` (default: file)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            store_path: env::var("STORE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
            backend: env::var("STORE_BACKEND")
                .ok()
                .and_then(|v| StoreBackend::parse(&v))
                .unwrap_or(StoreBackend::File),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            backend: StoreBackend::File,
        }
    }
}
