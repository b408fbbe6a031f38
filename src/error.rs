//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Storage Error Enum ==
/// Failure of the durable key-value medium.
///
/// These never reach callers of the public cache API; the cache logs them
/// and carries on in memory.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Medium missing or unusable in the current environment
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Write would exceed the medium's byte quota
    #[error("Storage quota exceeded: {used} of {quota} bytes")]
    QuotaExceeded { used: usize, quota: usize },

    /// Entry could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored record under this cache's prefix cannot be loaded
    #[error("Corrupt entry '{key}': {reason}")]
    CorruptEntry { key: String, reason: String },
}

// == Key Error Enum ==
/// Raised when a raw string does not name a well-known cache key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// No category matches the string
    #[error("Unknown cache key: {0}")]
    UnknownCategory(String),

    /// Parametrized category given without its parameter
    #[error("Cache key '{0}' is missing its parameter")]
    MissingParameter(String),
}

// == Result Type Alias ==
/// Convenience Result type for durable-medium operations.
pub type Result<T> = std::result::Result<T, StorageError>;
