//! Social Cache - TTL response cache for the social connect client
//!
//! Memoizes feed, explore, profile and search results for a bounded time,
//! mirroring them into a durable key-value store so they survive a restart.

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

pub use cache::{CacheKey, KeyCategory, TtlCache};
pub use config::Config;
pub use error::{KeyError, StorageError};
