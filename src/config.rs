//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Namespace prefix used by the web client's cache
pub const DEFAULT_PREFIX: &str = "social_connect_cache_";

/// Two minutes
pub const DEFAULT_TTL_MS: u64 = 2 * 60 * 1000;

/// Browser local storage quota
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix applied to every durable key the cache writes
    pub prefix: String,
    /// TTL in milliseconds for entries whose key category has no default
    pub default_ttl_ms: u64,
    /// Location of the durable store file, None = memory only
    pub storage_path: Option<PathBuf>,
    /// Byte quota of the durable store
    pub quota_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PREFIX` - Durable key prefix (default: `social_connect_cache_`)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 120000)
    /// - `CACHE_STORAGE_PATH` - Durable store file (default: unset, memory only)
    /// - `CACHE_QUOTA_BYTES` - Durable store quota (default: 5 MiB)
    pub fn from_env() -> Self {
        Self {
            prefix: env::var("CACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_MS),
            storage_path: env::var("CACHE_STORAGE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            quota_bytes: env::var("CACHE_QUOTA_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_QUOTA_BYTES),
        }
    }

    /// Overrides the storage path.
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl_ms: DEFAULT_TTL_MS,
            storage_path: None,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}
