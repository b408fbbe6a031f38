//! Durable Storage Module
//!
//! The persistent key-value medium the cache mirrors its entries into.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

// == Durable Store ==
/// A string-to-string store shared with other users of the same medium.
///
/// Modeled on browser local storage: point reads and writes plus indexed
/// enumeration of the keys currently present.
pub trait DurableStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key succeeds.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Number of keys currently stored.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Key at position `index` of the enumeration order, None past the end.
    fn key(&self, index: usize) -> Result<Option<String>>;

    /// Snapshot of every key starting with `prefix`.
    ///
    /// Collected up front so callers can remove keys without disturbing the
    /// enumeration.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for index in 0..self.len()? {
            if let Some(key) = self.key(index)? {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

/// Bytes a key/value pair counts against a quota.
pub(crate) fn item_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
