//! Bounded TTL cache implementation
//!
//! A generic, thread-safe keyed store that enforces a per-entry time-to-live
//! and a maximum entry count. Expired entries read as absent but stay in the
//! map until [`BoundedTtlCache::sweep_expired`] removes them or capacity
//! eviction pushes them out.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
#[cfg(feature = "observability")]
use tracing::debug;

use super::config::{CacheConfig, EvictionPolicy};
use super::entry::CacheEntry;
use super::stats::{CacheStats, MetricsCollector};
use crate::time::{Clock, SystemClock};

/// Internal storage for cache entries
#[derive(Debug)]
struct CacheStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    entries: HashMap<K, CacheEntry<V>>,
    /// Eviction order: lowest sequence number goes first
    order: BTreeMap<u64, K>,
    next_sequence: u64,
}

impl<K, V> CacheStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self { entries: HashMap::new(), order: BTreeMap::new(), next_sequence: 0 }
    }

    fn allocate_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.sequence);
        Some(entry)
    }

    fn evict_first(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }

    /// Move `key` to the back of the eviction order
    fn touch(&mut self, key: &K) {
        let sequence = self.allocate_sequence();
        if let Some(entry) = self.entries.get_mut(key) {
            let previous = std::mem::replace(&mut entry.sequence, sequence);
            self.order.remove(&previous);
            self.order.insert(sequence, key.clone());
        }
    }
}

/// Generic thread-safe cache bounded by TTL and entry count
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `V`: Value type (must be `Clone`); readers always receive a clone
/// - `C`: Clock type for time-based operations (defaults to `SystemClock`)
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use nimbus_common::cache::{BoundedTtlCache, CacheConfig};
///
/// let cache: BoundedTtlCache<String, i32> =
///     BoundedTtlCache::new(CacheConfig::bounded(Duration::from_secs(60), 2));
/// cache.put("a".to_string(), 1);
/// assert_eq!(cache.get(&"a".to_string()), Some(1));
/// ```
pub struct BoundedTtlCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    storage: Arc<RwLock<CacheStorage<K, V>>>,
    config: CacheConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl<K, V> BoundedTtlCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new cache with the given configuration using system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> BoundedTtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Create a new cache with a custom clock (useful for testing)
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        let metrics = MetricsCollector::new(config.track_metrics);
        Self { storage: Arc::new(RwLock::new(CacheStorage::new())), config, metrics, clock }
    }

    /// Value for `key` if present and not expired
    ///
    /// Records a hit or a miss. A hit updates `last_accessed` (and the
    /// eviction order under [`EvictionPolicy::Lru`]); nothing else changes.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut storage = self.storage.write();

        let value = match storage.entries.get_mut(key) {
            Some(entry) if entry.is_valid_at(now) => {
                entry.last_accessed = now;
                Some(entry.value.clone())
            }
            _ => None,
        };

        if value.is_some() {
            if self.config.eviction_policy == EvictionPolicy::Lru {
                storage.touch(key);
            }
            self.metrics.record_hit();
        } else {
            self.metrics.record_miss();
        }
        value
    }

    /// Like [`get`](Self::get) without touching statistics or access metadata
    pub fn peek(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let storage = self.storage.read();
        storage.entries.get(key).filter(|entry| entry.is_valid_at(now)).map(|e| e.value.clone())
    }

    /// Insert or replace `key` using the configured TTL
    ///
    /// See [`put_with_ttl`](Self::put_with_ttl).
    pub fn put(&self, key: K, value: V) -> Option<K> {
        self.put_with_ttl(key, value, self.config.ttl)
    }

    /// Insert or replace `key`, expiring after `ttl`
    ///
    /// Replacing resets the timestamps and moves the key to the back of the
    /// eviction order. When the cache is full and `key` is new, the single
    /// entry first in eviction order is removed beforehand and its key is
    /// returned. Never fails.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Option<K> {
        let now = self.clock.now();
        let capacity = self.max_size();
        let mut storage = self.storage.write();

        let evicted = if storage.remove(&key).is_some() {
            None
        } else if storage.entries.len() >= capacity {
            storage.evict_first()
        } else {
            None
        };

        let sequence = storage.allocate_sequence();
        storage.order.insert(sequence, key.clone());
        storage.entries.insert(key, CacheEntry::new(value, now, ttl, sequence));
        let size = storage.entries.len();
        drop(storage);

        self.metrics.record_insert();
        if evicted.is_some() {
            self.metrics.record_eviction();
            #[cfg(feature = "observability")]
            debug!(size, max_size = capacity, "Evicted cache entry to stay within capacity");
        }
        #[cfg(not(feature = "observability"))]
        let _ = size;

        evicted
    }

    /// Remove `key`; removing an absent key is a no-op
    pub fn remove(&self, key: &K) -> Option<V> {
        self.storage.write().remove(key).map(|entry| entry.value)
    }

    /// Remove every expired entry and return how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut storage = self.storage.write();

        let expired: Vec<K> = storage
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_valid_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            storage.remove(key);
        }
        drop(storage);

        self.metrics.record_expirations(expired.len() as u64);
        expired.len()
    }

    /// Remove every entry; counters are kept
    pub fn clear(&self) -> usize {
        let mut storage = self.storage.write();
        let removed = storage.entries.len();
        storage.entries.clear();
        storage.order.clear();
        removed
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.storage.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently stored, including expired ones not yet swept
    pub fn snapshot_keys(&self) -> HashSet<K> {
        self.storage.read().entries.keys().cloned().collect()
    }

    /// Copy of the stored entry for diagnostics; records no statistics
    pub fn entry_info(&self, key: &K) -> Option<CacheEntry<V>> {
        self.storage.read().entries.get(key).cloned()
    }

    /// Valid, not-refreshing keys with less than `lead` lifetime left,
    /// soonest to expire first
    pub fn expiring_within(&self, lead: Duration) -> Vec<K> {
        let now = self.clock.now();
        let storage = self.storage.read();

        let mut candidates: Vec<(Duration, K)> = storage
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_valid_at(now) && !entry.refreshing)
            .map(|(key, entry)| (entry.remaining_at(now), key))
            .filter(|(remaining, _)| *remaining < lead)
            .map(|(remaining, key)| (remaining, key.clone()))
            .collect();
        drop(storage);

        candidates.sort_by_key(|(remaining, _)| *remaining);
        candidates.into_iter().map(|(_, key)| key).collect()
    }

    /// Flag an existing entry as being refreshed; returns whether it exists
    pub fn set_refreshing(&self, key: &K, refreshing: bool) -> bool {
        let mut storage = self.storage.write();
        storage.entries.get_mut(key).map(|entry| entry.refreshing = refreshing).is_some()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.len(), self.max_size())
    }

    /// Effective capacity (at least one entry)
    pub fn max_size(&self) -> usize {
        self.config.max_size.max(1)
    }

    /// Default TTL applied by [`put`](Self::put)
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<K, V, C> Clone for BoundedTtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock + Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<K, V, C> std::fmt::Debug for BoundedTtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedTtlCache")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::core.
    use super::*;
    use crate::time::MockClock;

    fn cache_with(
        ttl_secs: u64,
        max_size: usize,
    ) -> (BoundedTtlCache<String, String, MockClock>, MockClock) {
        let clock = MockClock::new();
        let cache = BoundedTtlCache::with_clock(
            CacheConfig::bounded(Duration::from_secs(ttl_secs), max_size),
            clock.clone(),
        );
        (cache, clock)
    }

    fn key(s: &str) -> String {
        s.to_string()
    }

    /// Validates `BoundedTtlCache::put` and `get` for a fresh entry.
    ///
    /// Assertions:
    /// - Confirms the stored value is returned.
    /// - Confirms a hit is recorded.
    #[test]
    fn test_put_and_get() {
        let (cache, _clock) = cache_with(60, 10);
        assert_eq!(cache.put(key("beijing"), key("sunny")), None);

        assert_eq!(cache.get(&key("beijing")), Some(key("sunny")));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().inserts, 1);
    }

    /// Validates TTL correctness: an unswept expired entry reads as absent.
    ///
    /// Assertions:
    /// - Confirms the value is visible just before expiry.
    /// - Confirms `get` misses at `inserted_at + ttl` while `len` still
    ///   counts the entry.
    #[test]
    fn test_expired_entry_reads_as_absent() {
        let (cache, clock) = cache_with(10, 10);
        cache.put(key("shanghai"), key("cloudy"));

        clock.advance(Duration::from_millis(9_999));
        assert_eq!(cache.get(&key("shanghai")), Some(key("cloudy")));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get(&key("shanghai")), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().misses, 1);
    }

    /// Validates capacity eviction with the 北京/上海/广州 scenario.
    ///
    /// Assertions:
    /// - Confirms the oldest insertion is evicted when a third key arrives.
    /// - Confirms `get(北京)` one second later misses.
    /// - Confirms exactly one eviction is counted.
    #[test]
    fn test_oldest_inserted_evicted_at_capacity() {
        let (cache, clock) = cache_with(3600, 2);

        cache.put(key("北京"), key("晴"));
        clock.set_elapsed(Duration::from_secs(10));
        cache.put(key("上海"), key("多云"));
        clock.set_elapsed(Duration::from_secs(20));
        let evicted = cache.put(key("广州"), key("小雨"));

        assert_eq!(evicted, Some(key("北京")));
        assert_eq!(cache.snapshot_keys(), HashSet::from([key("上海"), key("广州")]));

        clock.set_elapsed(Duration::from_secs(21));
        assert_eq!(cache.get(&key("北京")), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
    }

    /// Validates that replacing a key resets its insertion order.
    ///
    /// Assertions:
    /// - Confirms a replace at capacity does not evict.
    /// - Confirms the replaced key becomes the newest entry.
    #[test]
    fn test_replace_moves_key_to_back() {
        let (cache, _clock) = cache_with(3600, 2);
        cache.put(key("a"), key("1"));
        cache.put(key("b"), key("2"));

        assert_eq!(cache.put(key("a"), key("3")), None);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.put(key("c"), key("4")), Some(key("b")));
        assert_eq!(cache.get(&key("a")), Some(key("3")));
    }

    /// Validates insertion order breaks ties when timestamps are equal.
    ///
    /// Assertions:
    /// - Confirms entries inserted at the same instant evict in put order.
    #[test]
    fn test_equal_timestamps_evict_in_put_order() {
        let (cache, _clock) = cache_with(3600, 3);
        cache.put(key("x"), key("1"));
        cache.put(key("y"), key("2"));
        cache.put(key("z"), key("3"));

        let first = cache.entry_info(&key("x")).unwrap();
        let second = cache.entry_info(&key("y")).unwrap();
        assert_eq!(first.inserted_at(), second.inserted_at());
        assert!(first.sequence() < second.sequence());

        assert_eq!(cache.put(key("w"), key("4")), Some(key("x")));
        assert_eq!(cache.put(key("v"), key("5")), Some(key("y")));
    }

    /// Validates reads do not change FIFO eviction order.
    ///
    /// Assertions:
    /// - Confirms the oldest insertion is evicted even after being read.
    #[test]
    fn test_fifo_ignores_reads() {
        let (cache, _clock) = cache_with(3600, 2);
        cache.put(key("a"), key("1"));
        cache.put(key("b"), key("2"));
        assert!(cache.get(&key("a")).is_some());

        assert_eq!(cache.put(key("c"), key("3")), Some(key("a")));
    }

    /// Validates the LRU policy moves read entries to the back.
    ///
    /// Assertions:
    /// - Confirms the unread entry is evicted first.
    #[test]
    fn test_lru_policy_respects_reads() {
        let clock = MockClock::new();
        let config = CacheConfig::builder()
            .max_size(2)
            .ttl(Duration::from_secs(60))
            .eviction_policy(EvictionPolicy::Lru)
            .build()
            .unwrap();
        let cache: BoundedTtlCache<String, String, MockClock> =
            BoundedTtlCache::with_clock(config, clock);

        cache.put(key("a"), key("1"));
        cache.put(key("b"), key("2"));
        assert!(cache.get(&key("a")).is_some());

        assert_eq!(cache.put(key("c"), key("3")), Some(key("b")));
    }

    /// Validates `sweep_expired` removes exactly the expired entries and is
    /// idempotent.
    ///
    /// Assertions:
    /// - Confirms the first sweep removes one entry.
    /// - Confirms an immediate second sweep removes zero.
    /// - Confirms expirations are counted once.
    #[test]
    fn test_sweep_is_idempotent() {
        let (cache, clock) = cache_with(100, 10);
        cache.put_with_ttl(key("short"), key("v"), Duration::from_secs(5));
        cache.put(key("long"), key("v"));

        clock.advance(Duration::from_secs(6));
        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.sweep_expired(), 0);

        assert_eq!(cache.snapshot_keys(), HashSet::from([key("long")]));
        assert_eq!(cache.stats().expirations, 1);
    }

    /// Validates `remove` is idempotent.
    ///
    /// Assertions:
    /// - Confirms the first remove returns the value, the second `None`.
    #[test]
    fn test_remove_idempotent() {
        let (cache, _clock) = cache_with(60, 10);
        cache.put(key("k"), key("v"));

        assert_eq!(cache.remove(&key("k")), Some(key("v")));
        assert_eq!(cache.remove(&key("k")), None);
        assert!(cache.is_empty());
    }

    /// Validates `peek` leaves statistics untouched.
    ///
    /// Assertions:
    /// - Confirms hits and misses stay at zero after peeking.
    #[test]
    fn test_peek_records_nothing() {
        let (cache, _clock) = cache_with(60, 10);
        cache.put(key("k"), key("v"));

        assert_eq!(cache.peek(&key("k")), Some(key("v")));
        assert_eq!(cache.peek(&key("missing")), None);
        assert_eq!(cache.stats().total_accesses(), 0);
    }

    /// Validates `expiring_within` ordering and the refreshing filter.
    ///
    /// Assertions:
    /// - Confirms only entries inside the lead window are listed.
    /// - Confirms refreshing entries are skipped.
    #[test]
    fn test_expiring_within() {
        let (cache, clock) = cache_with(100, 10);
        cache.put_with_ttl(key("soon"), key("v"), Duration::from_secs(30));
        cache.put_with_ttl(key("sooner"), key("v"), Duration::from_secs(20));
        cache.put(key("later"), key("v"));

        clock.advance(Duration::from_secs(15));
        assert_eq!(cache.expiring_within(Duration::from_secs(20)), vec![key("sooner"), key("soon")]);

        assert!(cache.set_refreshing(&key("sooner"), true));
        assert_eq!(cache.expiring_within(Duration::from_secs(20)), vec![key("soon")]);
        assert!(!cache.set_refreshing(&key("missing"), true));
    }

    /// Validates `clear` empties the cache but keeps counters.
    ///
    /// Assertions:
    /// - Confirms the number of removed entries.
    /// - Confirms the hit counter survives.
    #[test]
    fn test_clear_keeps_counters() {
        let (cache, _clock) = cache_with(60, 10);
        cache.put(key("a"), key("1"));
        cache.put(key("b"), key("2"));
        let _ = cache.get(&key("a"));

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 1);
    }

    /// Validates clones share storage.
    ///
    /// Assertions:
    /// - Confirms a value written through one handle is visible in the other.
    #[test]
    fn test_clone_shares_storage() {
        let (cache, _clock) = cache_with(60, 10);
        let other = cache.clone();
        cache.put(key("k"), key("v"));

        assert_eq!(other.get(&key("k")), Some(key("v")));
    }
}
