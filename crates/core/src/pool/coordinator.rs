//! Single-flight fetch coordination over a bounded TTL cache
//!
//! The coordinator owns a claim map from key to the shared future of the
//! upstream fetch currently running for that key. The first caller to miss
//! spawns the fetch and registers the claim; later callers for the same key
//! await a clone of the same shared future. Per key the lifecycle is
//! `Idle -> Fetching -> Idle`: the spawned task writes a successful value to
//! the cache and then drops the claim, so a key never has two fetches in
//! flight and a failed fetch never touches the cache.
//!
//! Fetches run in their own tokio task. Dropping a waiting caller does not
//! cancel the fetch; other waiters still receive the result and a success
//! still populates the cache.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use nimbus_common::cache::{BoundedTtlCache, CacheStats};
use nimbus_common::time::{Clock, SystemClock};
use nimbus_domain::{NimbusError, Result, Source};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::stats::{FetchCounters, FetchStats};

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;
type ClaimMap<K, V> = Arc<Mutex<HashMap<K, SharedFetch<V>>>>;

/// A value together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<V> {
    pub value: V,
    pub source: Source,
}

impl<V> Fetched<V> {
    pub fn cached(value: V) -> Self {
        Self { value, source: Source::Cached }
    }

    pub fn live(value: V) -> Self {
        Self { value, source: Source::Live }
    }
}

/// Releases a claim when the fetch task finishes, including by panic
///
/// On release the entry's refreshing flag is cleared, so a key whose fetch
/// unwound stays eligible for refresh-ahead. After a successful put the new
/// entry already carries a cleared flag.
struct ClaimGuard<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    claims: ClaimMap<K, V>,
    cache: BoundedTtlCache<K, V, C>,
    counters: Arc<FetchCounters>,
    key: K,
}

impl<K, V, C> Drop for ClaimGuard<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.counters.record_failed();
        }
        self.cache.set_refreshing(&self.key, false);
        self.claims.lock().remove(&self.key);
    }
}

/// Guarantees at most one concurrent upstream fetch per key
pub struct RefreshCoordinator<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    name: &'static str,
    cache: BoundedTtlCache<K, V, C>,
    claims: ClaimMap<K, V>,
    counters: Arc<FetchCounters>,
    fetch_timeout: Option<Duration>,
}

impl<K, V, C> RefreshCoordinator<K, V, C>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock + Clone + 'static,
{
    /// Wrap `cache`; `fetch_timeout` bounds every upstream fetch
    pub fn new(
        name: &'static str,
        cache: BoundedTtlCache<K, V, C>,
        fetch_timeout: Option<Duration>,
    ) -> Self {
        Self {
            name,
            cache,
            claims: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(FetchCounters::default()),
            fetch_timeout,
        }
    }

    /// Cached value for `key`, or the result of a single shared fetch
    ///
    /// A valid entry is returned immediately as [`Source::Cached`].
    /// Otherwise the caller joins the fetch already running for `key` or
    /// starts one with `fetch`; every waiter receives the same result as
    /// [`Source::Live`], so the tag always agrees with the hit/miss
    /// counters. `fetch` is only invoked when this call starts the fetch.
    ///
    /// # Errors
    /// The fetch's error, delivered identically to every waiter. Nothing is
    /// written to the cache and an existing stale entry stays as it was.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<Fetched<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        if let Some(value) = self.cache.get(&key) {
            return Ok(Fetched::cached(value));
        }
        self.join_or_start(key, fetch, false).await
    }

    /// Fetch `key` regardless of any valid entry and overwrite it on success
    ///
    /// Still at most one fetch per key: if one is in flight this call joins
    /// it. The previous entry stays readable until the new value lands.
    ///
    /// # Errors
    /// See [`get_or_fetch`](Self::get_or_fetch).
    pub async fn force_refresh<F, Fut>(&self, key: K, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        self.join_or_start(key, fetch, true).await.map(|fetched| fetched.value)
    }

    /// Refresh every entry with less than `lead` lifetime left
    ///
    /// Failures are logged and swallowed; the current entry stays until it
    /// expires. Returns how many entries were refreshed.
    pub async fn refresh_ahead<F, Fut>(&self, lead: Duration, mut fetch_for: F) -> usize
    where
        F: FnMut(&K) -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let candidates = self.cache.expiring_within(lead);
        if candidates.is_empty() {
            return 0;
        }

        debug!(cache = self.name, candidates = candidates.len(), "Refreshing entries ahead of expiry");
        let mut refreshed = 0;
        for key in candidates {
            let fetch = fetch_for(&key);
            match self.force_refresh(key.clone(), move || fetch).await {
                Ok(_) => refreshed += 1,
                Err(err) => warn!(
                    cache = self.name,
                    key = ?key,
                    error = %err,
                    "Refresh-ahead failed; keeping current entry until it expires"
                ),
            }
        }
        refreshed
    }

    async fn join_or_start<F, Fut>(&self, key: K, fetch: F, force: bool) -> Result<Fetched<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let shared = {
            let mut claims = self.claims.lock();
            if let Some(in_flight) = claims.get(&key).cloned() {
                self.counters.record_coalesced();
                debug!(cache = self.name, key = ?key, "Joining in-flight fetch");
                in_flight
            } else {
                // A fetch may have completed between the caller's miss and
                // taking the claim lock. The miss is already counted, so the
                // value is reported as live like any other joined fetch.
                if !force {
                    if let Some(value) = self.cache.peek(&key) {
                        return Ok(Fetched::live(value));
                    }
                }
                let started = self.spawn_fetch(key.clone(), fetch());
                claims.insert(key, started.clone());
                started
            }
        };

        shared.await.map(Fetched::live)
    }

    /// Spawn the upstream fetch; the caller must register the returned
    /// future in the claim map while still holding the claim lock
    fn spawn_fetch<Fut>(&self, key: K, fetch: Fut) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        self.counters.record_started();
        let cache = self.cache.clone();
        let counters = Arc::clone(&self.counters);
        let guard = ClaimGuard {
            claims: Arc::clone(&self.claims),
            cache: cache.clone(),
            counters: Arc::clone(&counters),
            key,
        };
        let timeout = self.fetch_timeout;
        let name = self.name;

        let task = tokio::spawn(async move {
            let guard = guard;
            cache.set_refreshing(&guard.key, true);

            let outcome = match timeout {
                Some(limit) => tokio::time::timeout(limit, fetch).await.unwrap_or_else(|_| {
                    Err(NimbusError::Timeout(format!("{name} fetch exceeded {limit:?}")))
                }),
                None => fetch.await,
            };

            match &outcome {
                Ok(value) => {
                    cache.put(guard.key.clone(), value.clone());
                    debug!(cache = name, key = ?guard.key, "Fetched and cached");
                }
                Err(err) => {
                    counters.record_failed();
                    warn!(cache = name, key = ?guard.key, error = %err, "Upstream fetch failed");
                }
            }
            outcome
        });

        async move {
            task.await.unwrap_or_else(|join_err| {
                Err(NimbusError::Internal(format!("{name} fetch task failed: {join_err}")))
            })
        }
        .boxed()
        .shared()
    }

    /// Whether a fetch for `key` is in flight
    pub fn is_fetching(&self, key: &K) -> bool {
        self.claims.lock().contains_key(key)
    }

    /// Number of keys with a fetch in flight
    pub fn in_flight(&self) -> usize {
        self.claims.lock().len()
    }

    pub fn cache(&self) -> &BoundedTtlCache<K, V, C> {
        &self.cache
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn fetch_stats(&self) -> FetchStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use nimbus_common::cache::CacheConfig;
    use nimbus_common::time::MockClock;
    use tokio::sync::Notify;

    use super::*;

    type TestCoordinator = RefreshCoordinator<String, String, MockClock>;

    fn coordinator(ttl_secs: u64, max_size: usize) -> (TestCoordinator, MockClock) {
        let clock = MockClock::new();
        let cache = BoundedTtlCache::with_clock(
            CacheConfig::bounded(Duration::from_secs(ttl_secs), max_size),
            clock.clone(),
        );
        (RefreshCoordinator::new("test_cache", cache, None), clock)
    }

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: &str,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<String>> {
        let calls = Arc::clone(calls);
        let value = value.to_string();
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn miss_fetches_then_hit_is_cached() {
        let (coordinator, _clock) = coordinator(60, 10);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = coordinator.get_or_fetch("k".into(), counting_fetch(&calls, "v1")).await.unwrap();
        assert_eq!(first, Fetched::live("v1".to_string()));

        let second = coordinator.get_or_fetch("k".into(), counting_fetch(&calls, "v2")).await.unwrap();
        assert_eq!(second, Fetched::cached("v1".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.in_flight(), 0);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let (coordinator, _clock) = coordinator(60, 10);
        let coordinator = Arc::new(coordinator);
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let slow_fetch = {
            let calls = Arc::clone(&calls);
            let release = Arc::clone(&release);
            move || {
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    release.notified().await;
                    Ok("shared".to_string())
                }
                .boxed()
            }
        };

        let leader = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.get_or_fetch("k".into(), slow_fetch).await })
        };
        while !coordinator.is_fetching(&"k".to_string()) {
            tokio::task::yield_now().await;
        }

        let followers: Vec<_> = (0..4)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    coordinator.get_or_fetch("k".into(), counting_fetch(&calls, "other")).await
                })
            })
            .collect();
        while coordinator.fetch_stats().coalesced < 4 {
            tokio::task::yield_now().await;
        }
        release.notify_one();

        assert_eq!(leader.await.unwrap().unwrap().value, "shared");
        for follower in followers {
            assert_eq!(follower.await.unwrap().unwrap(), Fetched::live("shared".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.fetch_stats().started, 1);
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_writes_nothing() {
        let (coordinator, _clock) = coordinator(60, 10);
        let coordinator = Arc::new(coordinator);
        let release = Arc::new(Notify::new());

        let failing = {
            let release = Arc::clone(&release);
            move || {
                async move {
                    release.notified().await;
                    Err(NimbusError::RateLimited("quota exhausted".into()))
                }
                .boxed()
            }
        };

        let leader = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.get_or_fetch("k".into(), failing).await })
        };
        while !coordinator.is_fetching(&"k".to_string()) {
            tokio::task::yield_now().await;
        }
        let follower = {
            let coordinator = Arc::clone(&coordinator);
            let calls = Arc::new(AtomicUsize::new(0));
            tokio::spawn(async move {
                coordinator.get_or_fetch("k".into(), counting_fetch(&calls, "never")).await
            })
        };
        while coordinator.fetch_stats().coalesced < 1 {
            tokio::task::yield_now().await;
        }
        release.notify_one();

        let expected = NimbusError::RateLimited("quota exhausted".into());
        assert_eq!(leader.await.unwrap().unwrap_err(), expected);
        assert_eq!(follower.await.unwrap().unwrap_err(), expected);
        assert!(coordinator.cache().is_empty());
        assert_eq!(coordinator.in_flight(), 0);
        assert_eq!(coordinator.fetch_stats().failed, 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_entry() {
        let (coordinator, clock) = coordinator(60, 10);
        coordinator.cache().put("k".into(), "old".into());
        clock.advance(Duration::from_secs(61));

        let err = coordinator
            .get_or_fetch("k".into(), || async { Err(NimbusError::Network("reset".into())) })
            .await
            .unwrap_err();
        assert_eq!(err, NimbusError::Network("reset".into()));

        let entry = coordinator.cache().entry_info(&"k".to_string()).unwrap();
        assert_eq!(entry.value(), "old");
        assert!(!entry.is_refreshing());
    }

    #[tokio::test]
    async fn force_refresh_bypasses_valid_entry() {
        let (coordinator, _clock) = coordinator(60, 10);
        let calls = Arc::new(AtomicUsize::new(0));
        coordinator.cache().put("k".into(), "old".into());

        let value = coordinator.force_refresh("k".into(), counting_fetch(&calls, "new")).await.unwrap();

        assert_eq!(value, "new");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.cache().peek(&"k".to_string()), Some("new".to_string()));
    }

    #[tokio::test]
    async fn fetch_timeout_releases_claim() {
        let clock = MockClock::new();
        let cache = BoundedTtlCache::with_clock(CacheConfig::default(), clock);
        let coordinator: TestCoordinator =
            RefreshCoordinator::new("test_cache", cache, Some(Duration::from_millis(20)));

        let err = coordinator
            .get_or_fetch("k".into(), || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("late".to_string())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, NimbusError::Timeout(_)));
        assert_eq!(coordinator.in_flight(), 0);
        assert!(coordinator.cache().is_empty());
    }

    #[tokio::test]
    async fn dropped_leader_does_not_cancel_fetch() {
        let (coordinator, _clock) = coordinator(60, 10);
        let coordinator = Arc::new(coordinator);
        let release = Arc::new(Notify::new());

        let slow_fetch = {
            let release = Arc::clone(&release);
            move || {
                async move {
                    release.notified().await;
                    Ok("v".to_string())
                }
                .boxed()
            }
        };

        let leader = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.get_or_fetch("k".into(), slow_fetch).await })
        };
        while !coordinator.is_fetching(&"k".to_string()) {
            tokio::task::yield_now().await;
        }
        let follower = {
            let coordinator = Arc::clone(&coordinator);
            let calls = Arc::new(AtomicUsize::new(0));
            tokio::spawn(async move {
                coordinator.get_or_fetch("k".into(), counting_fetch(&calls, "other")).await
            })
        };
        while coordinator.fetch_stats().coalesced < 1 {
            tokio::task::yield_now().await;
        }

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());
        release.notify_one();

        assert_eq!(follower.await.unwrap().unwrap(), Fetched::live("v".to_string()));
        assert_eq!(coordinator.cache().peek(&"k".to_string()), Some("v".to_string()));
        assert_eq!(coordinator.in_flight(), 0);
        assert_eq!(coordinator.fetch_stats().started, 1);
    }

    fn broken_provider() -> Result<String> {
        panic!("provider client bug")
    }

    #[tokio::test]
    async fn panicking_fetch_releases_claim_and_refresh_flag() {
        let (coordinator, clock) = coordinator(100, 10);
        coordinator.cache().put("k".into(), "old".into());
        clock.advance(Duration::from_secs(85));

        let err = coordinator
            .force_refresh("k".into(), || async { broken_provider() })
            .await
            .unwrap_err();

        assert!(matches!(err, NimbusError::Internal(_)), "got {err:?}");
        assert_eq!(coordinator.in_flight(), 0);
        assert_eq!(coordinator.fetch_stats().failed, 1);
        let entry = coordinator.cache().entry_info(&"k".to_string()).unwrap();
        assert_eq!(entry.value(), "old");
        assert!(!entry.is_refreshing());

        let lead = Duration::from_secs(20);
        assert_eq!(coordinator.cache().expiring_within(lead), vec!["k".to_string()]);
        let refreshed = coordinator.refresh_ahead(lead, |_| async { Ok("new".to_string()) }).await;
        assert_eq!(refreshed, 1);
        assert_eq!(coordinator.cache().peek(&"k".to_string()), Some("new".to_string()));
    }

    #[tokio::test]
    async fn value_landing_before_claim_is_reported_live() {
        let (coordinator, _clock) = coordinator(60, 10);
        let calls = Arc::new(AtomicUsize::new(0));
        coordinator.cache().put("k".into(), "landed".into());

        let fetched = coordinator
            .join_or_start("k".into(), counting_fetch(&calls, "other"), false)
            .await
            .unwrap();

        assert_eq!(fetched, Fetched::live("landed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.fetch_stats().started, 0);
    }

    #[tokio::test]
    async fn refresh_ahead_swallows_failures() {
        let (coordinator, clock) = coordinator(100, 10);
        coordinator.cache().put("good".into(), "v1".into());
        coordinator.cache().put("bad".into(), "v1".into());
        clock.advance(Duration::from_secs(85));

        let refreshed = coordinator
            .refresh_ahead(Duration::from_secs(20), |key| {
                let key = key.clone();
                async move {
                    if key == "bad" {
                        Err(NimbusError::Network("down".into()))
                    } else {
                        Ok("v2".to_string())
                    }
                }
            })
            .await;

        assert_eq!(refreshed, 1);
        assert_eq!(coordinator.cache().peek(&"good".to_string()), Some("v2".to_string()));
        assert_eq!(coordinator.cache().peek(&"bad".to_string()), Some("v1".to_string()));
    }
}
