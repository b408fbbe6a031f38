//! Cache Store Module
//!
//! TTL cache holding entries in memory and mirroring them into a durable
//! key-value medium so they survive a restart.
//!
//! The durable mirror is best-effort. Every failure of the medium is logged,
//! counted in [`CacheStats::persist_failures`] and otherwise ignored: reads and
//! writes keep working from the in-memory table.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheKey, CacheStats, Clock, KeyCategory, SystemClock};
use crate::config::{Config, DEFAULT_PREFIX, DEFAULT_TTL_MS};
use crate::error::{Result, StorageError};
use crate::storage::{DurableStore, FileStore};

// == TTL Cache ==
/// Key-value cache with per-entry TTL and a durable mirror.
///
/// Expiry is detected only on access; nothing sweeps in the background.
pub struct TtlCache {
    /// Entries keyed by canonical key, expired ones included until touched
    entries: HashMap<CacheKey, CacheEntry>,
    /// Prefix of every durable key this cache owns
    prefix: String,
    /// Durable mirror, None = memory only
    durable: Option<Box<dyn DurableStore>>,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
    /// TTL for keys whose category has no default of its own
    default_ttl_ms: u64,
}

impl TtlCache {
    // == Constructors ==
    /// Creates a cache mirrored into `durable` and hydrates it from the
    /// entries already stored there under `prefix`.
    pub fn new(prefix: impl Into<String>, durable: impl DurableStore + 'static) -> Self {
        Self::build(prefix.into(), Some(Box::new(durable)))
    }

    /// Creates a cache with no durable mirror.
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self::build(prefix.into(), None)
    }

    /// Creates a cache on the file store named by `config`.
    ///
    /// A store that cannot be opened leaves the cache memory-only.
    pub fn from_config(config: &Config) -> Self {
        let durable: Option<Box<dyn DurableStore>> = match &config.storage_path {
            None => None,
            Some(path) => match FileStore::open(path) {
                Ok(store) => Some(Box::new(store.with_quota(config.quota_bytes))),
                Err(e) => {
                    warn!(
                        "Cannot open cache store {}: {}, running in memory only",
                        path.display(),
                        e
                    );
                    None
                }
            },
        };
        Self::build(config.prefix.clone(), durable).with_default_ttl(config.default_ttl_ms)
    }

    /// An empty prefix would claim every key on a shared medium, so it is
    /// replaced by [`DEFAULT_PREFIX`].
    fn build(prefix: String, durable: Option<Box<dyn DurableStore>>) -> Self {
        let prefix = if prefix.is_empty() {
            warn!("Empty cache prefix, using {}", DEFAULT_PREFIX);
            DEFAULT_PREFIX.to_string()
        } else {
            prefix
        };
        let mut cache = Self {
            entries: HashMap::new(),
            prefix,
            durable,
            clock: Arc::new(SystemClock),
            stats: CacheStats::new(),
            default_ttl_ms: DEFAULT_TTL_MS,
        };
        cache.hydrate();
        cache
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the fallback TTL.
    pub fn with_default_ttl(mut self, ttl_ms: u64) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }

    // == Hydration ==
    /// Loads every durable entry under the prefix verbatim, keeping its
    /// original store time. Bad records are skipped one by one.
    fn hydrate(&mut self) {
        let Some(durable) = &self.durable else {
            return;
        };

        let storage_keys = match durable.keys_with_prefix(&self.prefix) {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Cache hydration skipped, cannot enumerate store: {}", e);
                self.stats.record_persist_failure();
                return;
            }
        };

        let mut skipped = 0;
        for storage_key in storage_keys {
            match load_entry(&**durable, &self.prefix, &storage_key) {
                Ok(Some((key, entry))) => {
                    self.entries.insert(key, entry);
                }
                // Removed between enumeration and read
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping cached record {}: {}", storage_key, e);
                    skipped += 1;
                }
            }
        }

        self.stats.set_total_entries(self.entries.len());
        info!(
            "Cache hydrated: prefix={}, loaded={}, skipped={}",
            self.prefix,
            self.entries.len(),
            skipped
        );
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// `ttl_ms` of None selects the key category's TTL, or the cache default
    /// when the category has none.
    pub fn set(&mut self, key: CacheKey, value: Value, ttl_ms: Option<u64>) {
        let ttl_ms = ttl_ms
            .or(key.category().default_ttl_ms())
            .unwrap_or(self.default_ttl_ms);
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);

        let result = self.persist(&key, &entry);
        if result.is_err() {
            // Drop any older record so a restart cannot resurrect it
            let cleanup = self.unpersist(&key);
            self.absorb("remove superseded", &key, cleanup);
        }
        self.absorb("write", &key, result);

        debug!("Cache set: key={}, ttl_ms={}", key, ttl_ms);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the value under `key` if it is live.
    ///
    /// An expired entry is removed from memory and the durable mirror.
    pub fn get(&mut self, key: &CacheKey) -> Option<Value> {
        if !self.check_live(key) {
            self.stats.record_miss();
            debug!("Cache miss: key={}", key);
            return None;
        }
        self.stats.record_hit();
        debug!("Cache hit: key={}", key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Like [`TtlCache::get`], decoding the value into `T`.
    ///
    /// A value of a different shape is treated as absent.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &CacheKey) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Cached value for {} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    // == Has ==
    /// Returns whether a live entry exists for `key`.
    pub fn has(&mut self, key: &CacheKey) -> bool {
        self.check_live(key)
    }

    // == Memoized Fetch ==
    /// Returns the live value under `key`, or computes it with `fetch`,
    /// caches it and returns it. Errors from `fetch` are passed through and
    /// nothing is cached.
    pub fn get_or_try_insert_with<E, F>(
        &mut self,
        key: CacheKey,
        ttl_ms: Option<u64>,
        fetch: F,
    ) -> std::result::Result<Value, E>
    where
        F: FnOnce() -> std::result::Result<Value, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch()?;
        self.set(key, value.clone(), ttl_ms);
        Ok(value)
    }

    /// Infallible form of [`TtlCache::get_or_try_insert_with`].
    pub fn get_or_insert_with<F>(&mut self, key: CacheKey, ttl_ms: Option<u64>, fetch: F) -> Value
    where
        F: FnOnce() -> Value,
    {
        match self.get_or_try_insert_with(key, ttl_ms, || Ok::<_, Infallible>(fetch())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    // == Delete ==
    /// Removes the entry under `key`. Missing keys are ignored.
    pub fn delete(&mut self, key: &CacheKey) {
        self.entries.remove(key);
        let result = self.unpersist(key);
        self.absorb("remove", key, result);
        self.stats.set_total_entries(self.entries.len());
    }

    /// Removes every entry of `category`, returning how many were held.
    pub fn delete_category(&mut self, category: KeyCategory) -> usize {
        let keys: Vec<CacheKey> = self
            .entries
            .keys()
            .filter(|key| key.category() == category)
            .cloned()
            .collect();
        for key in &keys {
            self.delete(key);
        }
        keys.len()
    }

    /// Drops the feed, explore and recent-user listings so the next read
    /// refetches them.
    pub fn invalidate_feeds(&mut self) {
        self.delete(&CacheKey::feed_posts());
        self.delete(&CacheKey::explore_posts());
        self.delete(&CacheKey::recent_users());
    }

    // == Clear ==
    /// Removes every entry this cache owns.
    ///
    /// Only durable keys under this cache's prefix are touched.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);

        let Some(durable) = &self.durable else {
            return;
        };
        let result = durable.keys_with_prefix(&self.prefix).and_then(|keys| {
            let mut failure = None;
            for storage_key in keys {
                if let Err(e) = durable.remove_item(&storage_key) {
                    failure = Some(e);
                }
            }
            failure.map_or(Ok(()), Err)
        });
        if let Err(e) = result {
            warn!("Durable clear failed for prefix {}: {}", self.prefix, e);
            self.stats.record_persist_failure();
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries now, returning how many were removed.
    ///
    /// Never runs on its own.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.evict_expired(key);
        }
        self.stats.set_total_entries(self.entries.len());
        expired.len()
    }

    // == Introspection ==
    /// Remaining TTL of a live entry in milliseconds.
    pub fn ttl_remaining(&self, key: &CacheKey) -> Option<u64> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.ttl_remaining_ms(now))
    }

    /// Live keys, sorted.
    pub fn keys(&self) -> Vec<CacheKey> {
        let now = self.clock.now_ms();
        let mut keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        keys
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Entries held in memory, expired ones not yet touched included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internals ==
    /// Liveness check with lazy eviction.
    fn check_live(&mut self, key: &CacheKey) -> bool {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            None => return false,
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            self.evict_expired(key);
            self.stats.set_total_entries(self.entries.len());
            return false;
        }
        true
    }

    fn evict_expired(&mut self, key: &CacheKey) {
        self.entries.remove(key);
        self.stats.record_expiration();
        debug!("Cache entry expired: key={}", key);
        let result = self.unpersist(key);
        self.absorb("remove expired", key, result);
    }

    fn storage_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn persist(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        let Some(durable) = &self.durable else {
            return Ok(());
        };
        let record = entry.to_record()?;
        durable.set_item(&self.storage_key(key), &record)
    }

    fn unpersist(&self, key: &CacheKey) -> Result<()> {
        let Some(durable) = &self.durable else {
            return Ok(());
        };
        durable.remove_item(&self.storage_key(key))
    }

    /// Logs and counts a durable failure; the caller carries on in memory.
    fn absorb(&mut self, op: &str, key: &CacheKey, result: Result<()>) {
        if let Err(e) = result {
            warn!("Durable {} failed for {}: {}", op, key, e);
            self.stats.record_persist_failure();
        }
    }
}

/// Reads one durable record back into a key and entry.
fn load_entry(
    durable: &dyn DurableStore,
    prefix: &str,
    storage_key: &str,
) -> Result<Option<(CacheKey, CacheEntry)>> {
    let corrupt = |reason: String| StorageError::CorruptEntry {
        key: storage_key.to_string(),
        reason,
    };

    let raw_key = storage_key
        .strip_prefix(prefix)
        .ok_or_else(|| corrupt("outside cache prefix".to_string()))?;
    let key: CacheKey = raw_key.parse().map_err(|e| corrupt(format!("{}", e)))?;

    let Some(record) = durable.get_item(storage_key)? else {
        return Ok(None);
    };
    let entry = CacheEntry::from_record(&record)?;
    Ok(Some((key, entry)))
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("prefix", &self.prefix)
            .field("entries", &self.entries.len())
            .field("durable", &self.durable.is_some())
            .field("default_ttl_ms", &self.default_ttl_ms)
            .finish()
    }
}
