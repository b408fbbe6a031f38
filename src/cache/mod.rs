//! Cache Module
//!
//! Provides a TTL cache with an in-memory table and a durable mirror.

mod clock;
mod entry;
mod key;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{CacheKey, KeyCategory};
pub use stats::CacheStats;
pub use store::TtlCache;
