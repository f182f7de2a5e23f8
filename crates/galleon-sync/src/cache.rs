//! Bounded, TTL'd, thread-safe cache for expensive aggregate views.
//!
//! [`BoundedCache`] protects computations like the filter-options
//! aggregation: at most `max_size` live entries, entries older than the
//! TTL count as misses and are evicted lazily on access, and inserting at
//! capacity evicts the single oldest-timestamp entry. All operations take
//! one mutex around the whole read-modify-write, which is what makes the
//! eviction scan safe against concurrent callers.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Cumulative hit/miss counters and current occupancy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hit percentage over all lookups, 0.0 when none were made.
    pub hit_rate: f64,
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
    /// Monotonic insertion counter; breaks timestamp ties so eviction is
    /// deterministic.
    seq: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    hits: u64,
    misses: u64,
    next_seq: u64,
}

/// Generic size- and time-bounded cache.
///
/// Eviction is oldest-timestamp (insertion-ordered), an LRU approximation:
/// re-`set`ting a key refreshes its timestamp, plain `get`s do not.
pub struct BoundedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    max_size: usize,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    /// Creates a cache holding at most `max_size` entries, each living at
    /// most `ttl` from insertion.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        BoundedCache {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                next_seq: 0,
            }),
            max_size,
            ttl,
        }
    }

    /// Returns the cached value when present and unexpired; an expired
    /// entry is removed and counted as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");

        // Clone out before touching counters so the map borrow ends first.
        let lookup = inner.entries.get(key).map(|entry| {
            if entry.stored_at.elapsed() < self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        });

        match lookup {
            Some(Some(value)) => {
                inner.hits += 1;
                Some(value)
            }
            Some(None) => {
                inner.entries.remove(key);
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Stores a value, evicting the oldest entry first when inserting a
    /// new key at capacity.
    pub fn set(&self, key: K, value: V) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        if inner.entries.len() >= self.max_size && !inner.entries.contains_key(&key) {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.stored_at, entry.seq))
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
            }
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
                seq,
            },
        );
    }

    /// Drops all entries and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    /// Snapshot of occupancy and hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        let total = inner.hits + inner.misses;
        CacheStats {
            size: inner.entries.len(),
            max_size: self.max_size,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: if total > 0 {
                inner.hits as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(300);

    #[test]
    fn get_after_set_hits() {
        let cache: BoundedCache<String, i32> = BoundedCache::new(10, LONG);
        cache.set("a".into(), 1);
        assert_eq!(cache.get(&"a".into()), Some(1));
        assert_eq!(cache.get(&"b".into()), None);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.hit_rate, 50.0);
    }

    #[test]
    fn capacity_evicts_exactly_the_oldest_entry() {
        let cache: BoundedCache<String, i32> = BoundedCache::new(2, LONG);
        cache.set("first".into(), 1);
        cache.set("second".into(), 2);
        cache.set("third".into(), 3);

        assert_eq!(cache.stats().size, 2);
        assert_eq!(cache.get(&"first".into()), None);
        assert_eq!(cache.get(&"second".into()), Some(2));
        assert_eq!(cache.get(&"third".into()), Some(3));
    }

    #[test]
    fn resetting_an_existing_key_does_not_evict() {
        let cache: BoundedCache<String, i32> = BoundedCache::new(2, LONG);
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        cache.set("a".into(), 10);

        assert_eq!(cache.stats().size, 2);
        assert_eq!(cache.get(&"a".into()), Some(10));
        assert_eq!(cache.get(&"b".into()), Some(2));
    }

    #[test]
    fn expired_entry_is_a_miss_and_is_removed() {
        let cache: BoundedCache<String, i32> = BoundedCache::new(10, Duration::ZERO);
        cache.set("a".into(), 1);
        assert_eq!(cache.get(&"a".into()), None);
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn clear_resets_data_and_counters() {
        let cache: BoundedCache<String, i32> = BoundedCache::new(10, LONG);
        cache.set("a".into(), 1);
        cache.get(&"a".into());
        cache.get(&"b".into());
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!((stats.hits, stats.misses), (0, 0));
        assert_eq!(cache.get(&"a".into()), None);
    }

    #[test]
    fn shared_across_threads() {
        use std::sync::Arc;

        let cache: Arc<BoundedCache<u32, u32>> = Arc::new(BoundedCache::new(64, LONG));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..32 {
                        cache.set(t * 100 + i, i);
                        cache.get(&(t * 100 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.stats().size <= 64);
        assert_eq!(cache.stats().hits, 128);
    }
}
