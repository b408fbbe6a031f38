//! Property-Based Tests for Cache Module
//!
//! Uses proptest with a manual clock so expiry is checked without sleeping.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::cache::{CacheKey, Clock, ManualClock, TtlCache};
use crate::storage::{DurableStore, MemoryStore};

// == Test Configuration ==
const PREFIX: &str = "prop_cache_";
const START_MS: u64 = 1_700_000_000_000;

// == Strategies ==
/// Generates keys from every category
fn key_strategy() -> impl Strategy<Value = CacheKey> {
    (0usize..8, "[a-z0-9]{1,12}").prop_map(|(category, param)| match category {
        0 => CacheKey::feed_posts(),
        1 => CacheKey::explore_posts(),
        2 => CacheKey::recent_users(),
        3 => CacheKey::user_profile(&param),
        4 => CacheKey::user_posts(&param),
        5 => CacheKey::notifications(&param),
        6 => CacheKey::search_users(&param),
        _ => CacheKey::search_posts(&param),
    })
}

/// Generates JSON payloads shaped like query results
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,64}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        prop::collection::vec("[a-z0-9]{1,8}", 0..5)
            .prop_map(|ids| json!(ids.into_iter().map(|id| json!({"id": id})).collect::<Vec<_>>())),
    ]
}

fn ttl_strategy() -> impl Strategy<Value = u64> {
    1u64..10_000_000
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: CacheKey, value: Value, ttl: u64 },
    Get { key: CacheKey },
    Delete { key: CacheKey },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy(), 1u64..5_000)
            .prop_map(|(key, value, ttl)| CacheOp::Set { key, value, ttl }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        (0u64..3_000).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

fn fresh_cache(store: &MemoryStore, clock: &ManualClock) -> TtlCache {
    TtlCache::new(PREFIX, store.clone()).with_clock(clock.clone())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A value just written reads back unchanged
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy(), ttl in ttl_strategy()) {
        let clock = ManualClock::new(START_MS);
        let mut cache = fresh_cache(&MemoryStore::new(), &clock);

        cache.set(key.clone(), value.clone(), Some(ttl));

        prop_assert!(cache.has(&key));
        prop_assert_eq!(cache.get(&key), Some(value));
    }

    // Once the TTL has elapsed the entry is gone from memory and the store
    #[test]
    fn prop_ttl_expiration(
        key in key_strategy(),
        value in value_strategy(),
        ttl in ttl_strategy(),
        extra in 0u64..100_000
    ) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(START_MS);
        let mut cache = fresh_cache(&store, &clock);

        cache.set(key.clone(), value, Some(ttl));
        clock.advance(ttl + extra);

        prop_assert_eq!(cache.get(&key), None);
        prop_assert!(!cache.has(&key));
        prop_assert!(cache.is_empty());
        prop_assert!(store.is_empty().unwrap());
    }

    // The second write decides both value and expiry
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy(),
        ttl1 in ttl_strategy(),
        ttl2 in ttl_strategy(),
        gap in 0u64..1_000
    ) {
        let clock = ManualClock::new(START_MS);
        let mut cache = fresh_cache(&MemoryStore::new(), &clock);

        cache.set(key.clone(), value1, Some(ttl1));
        clock.advance(gap);
        cache.set(key.clone(), value2.clone(), Some(ttl2));

        prop_assert_eq!(cache.get(&key), Some(value2));
        prop_assert_eq!(cache.len(), 1);

        clock.advance(ttl2 - 1);
        prop_assert!(cache.has(&key));
        clock.advance(1);
        prop_assert!(!cache.has(&key));
    }

    // Deleting twice, or deleting something never stored, changes nothing else
    #[test]
    fn prop_delete_idempotent(
        stored in key_strategy(),
        missing in key_strategy(),
        value in value_strategy()
    ) {
        prop_assume!(stored != missing);
        let store = MemoryStore::new();
        let clock = ManualClock::new(START_MS);
        let mut cache = fresh_cache(&store, &clock);
        cache.set(stored.clone(), value.clone(), Some(60_000));

        cache.delete(&missing);
        cache.delete(&missing);

        prop_assert_eq!(cache.get(&stored), Some(value));
        prop_assert_eq!(store.len().unwrap(), 1);
    }

    // A fresh instance on the same store sees live entries and drops stale ones
    #[test]
    fn prop_hydration_roundtrip(
        key in key_strategy(),
        value in value_strategy(),
        ttl in ttl_strategy(),
        elapsed in 0u64..20_000_000
    ) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(START_MS);
        fresh_cache(&store, &clock).set(key.clone(), value.clone(), Some(ttl));

        clock.advance(elapsed);
        let mut reloaded = fresh_cache(&store, &clock);

        if elapsed < ttl {
            prop_assert_eq!(reloaded.get(&key), Some(value));
            prop_assert_eq!(store.len().unwrap(), 1);
        } else {
            prop_assert_eq!(reloaded.get(&key), None);
            prop_assert!(store.is_empty().unwrap());
        }
    }

    // A store that refuses every write leaves the in-memory behaviour intact
    #[test]
    fn prop_rejecting_store_behaves_like_memory(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let clock = ManualClock::new(START_MS);
        let mut rejecting = TtlCache::new(PREFIX, MemoryStore::with_quota(0)).with_clock(clock.clone());
        let mut memory = TtlCache::in_memory(PREFIX).with_clock(clock.clone());

        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => {
                    rejecting.set(key.clone(), value.clone(), Some(ttl));
                    memory.set(key, value, Some(ttl));
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(rejecting.get(&key), memory.get(&key));
                }
                CacheOp::Delete { key } => {
                    rejecting.delete(&key);
                    memory.delete(&key);
                }
                CacheOp::Advance { ms } => clock.advance(ms),
            }
        }

        prop_assert_eq!(rejecting.keys(), memory.keys());
        rejecting.clear();
        prop_assert!(rejecting.is_empty());
    }

    // Reads agree with a simple model and the counters add up
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(START_MS);
        let mut cache = fresh_cache(&store, &clock);
        let mut model: HashMap<CacheKey, (Value, u64)> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => {
                    let expires = clock.now_ms() + ttl;
                    model.insert(key.clone(), (value.clone(), expires));
                    cache.set(key, value, Some(ttl));
                }
                CacheOp::Get { key } => {
                    let now = clock.now_ms();
                    let expected = match model.get(&key) {
                        Some((value, expires)) if now < *expires => Some(value.clone()),
                        _ => None,
                    };
                    if expected.is_some() {
                        expected_hits += 1;
                    } else {
                        expected_misses += 1;
                        model.remove(&key);
                    }
                    prop_assert_eq!(cache.get(&key), expected);
                }
                CacheOp::Delete { key } => {
                    model.remove(&key);
                    cache.delete(&key);
                }
                CacheOp::Advance { ms } => clock.advance(ms),
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, cache.len(), "Total entries mismatch");
        prop_assert_eq!(stats.persist_failures, 0);
        // Mirror holds exactly what memory holds
        prop_assert_eq!(store.len().unwrap(), cache.len());
    }

    // Clearing one namespace never touches another
    #[test]
    fn prop_clear_namespace_isolation(
        ours in prop::collection::vec((key_strategy(), value_strategy()), 0..20),
        foreign in prop::collection::btree_map("[a-z_]{1,16}", "[a-z]{0,8}", 0..10)
    ) {
        let store = MemoryStore::new();
        for (key, value) in &foreign {
            store.set_item(&format!("other_{}", key), value).unwrap();
        }
        let clock = ManualClock::new(START_MS);
        let mut cache = fresh_cache(&store, &clock);
        for (key, value) in ours {
            cache.set(key, value, Some(60_000));
        }

        cache.clear();

        prop_assert!(cache.is_empty());
        let remaining = store.snapshot().unwrap();
        prop_assert_eq!(remaining.len(), foreign.len());
        for (key, value) in &foreign {
            prop_assert_eq!(remaining.get(&format!("other_{}", key)), Some(value));
        }
    }
}
