//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A cached payload with the instant it was stored and how long it lives.
///
/// Serialized as `{"data": .., "timestamp": .., "expiresIn": ..}`, the record
/// format the web client writes into browser storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    #[serde(rename = "data")]
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    #[serde(rename = "timestamp")]
    pub stored_at: u64,
    /// Time to live in milliseconds
    #[serde(rename = "expiresIn")]
    pub ttl_ms: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stored at `now_ms` that lives for `ttl_ms`.
    pub fn new(value: Value, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            stored_at: now_ms,
            ttl_ms,
        }
    }

    // == Is Live ==
    /// Checks whether the entry is still live at `now_ms`.
    ///
    /// Live iff `now - stored_at < ttl`: once the full TTL has elapsed the
    /// entry is expired. A clock reading earlier than `stored_at` counts as
    /// zero elapsed time.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at) < self.ttl_ms
    }

    /// Inverse of [`CacheEntry::is_live`].
    pub fn is_expired(&self, now_ms: u64) -> bool {
        !self.is_live(now_ms)
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.stored_at);
        self.ttl_ms.saturating_sub(elapsed)
    }

    // == Encoding ==
    /// Encodes the entry for the durable medium.
    pub fn to_record(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes an entry read back from the durable medium.
    pub fn from_record(record: &str) -> serde_json::Result<Self> {
        serde_json::from_str(record)
    }
}
