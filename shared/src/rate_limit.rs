//! Sliding-window rate limiting and TTL caching for outbound service calls
//!
//! [`SlidingWindowLimiter`] suspends callers once `max_calls` calls landed in
//! the trailing window and resumes them as the oldest call ages out.
//! [`TtlCache`] stores results with a per-entry expiry. [`RateLimitedCache`]
//! composes the two: a live cache entry short-circuits the call, a miss waits
//! for limiter capacity, calls through and stores the value. Errors are never
//! cached.
//!
//! All clocks are `tokio::time::Instant` so a paused runtime drives them in
//! tests.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::SharedResult;

/// Default capacity of a [`TtlCache`]
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Sliding-window limiter shared by every wrapper of one service
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until the window has room, then record a call
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                Self::evict_expired(&mut calls, now, self.window);

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }

                match calls.front() {
                    Some(&oldest) => self.window.saturating_sub(now.duration_since(oldest)),
                    None => Duration::ZERO,
                }
            };

            debug!("⏳ Rate limit reached ({} calls / {:?}), waiting {:?}", self.max_calls, self.window, wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Calls recorded inside the current window
    pub async fn recent_calls(&self) -> usize {
        let mut calls = self.calls.lock().await;
        Self::evict_expired(&mut calls, Instant::now(), self.window);
        calls.len()
    }

    fn evict_expired(calls: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&oldest) = calls.front() {
            if now.duration_since(oldest) >= window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Bounded cache whose entries expire after a per-entry time to live
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`; expired entries are dropped on the way
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.ttl).await;
    }

    /// Store `value` unless a live entry already exists; stored values are never replaced
    pub async fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        if let Some(entry) = entries.get(&key) {
            if entry.expires_at > now {
                return;
            }
        }

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, entry| entry.expires_at > now);
            if entries.len() >= self.capacity {
                let soonest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(evicted) = soonest {
                    entries.remove(&evicted);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

/// TTL cache in front of a rate-limited operation
pub struct RateLimitedCache<V> {
    limiter: Arc<SlidingWindowLimiter>,
    cache: TtlCache<String, V>,
}

impl<V> RateLimitedCache<V>
where
    V: Clone + Send + Sync,
{
    pub fn new(limiter: Arc<SlidingWindowLimiter>, ttl: Duration, capacity: usize) -> Self {
        Self {
            limiter,
            cache: TtlCache::new(ttl, capacity),
        }
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Deterministic key for a set of call arguments
    pub fn cache_key<A>(args: &A) -> SharedResult<String>
    where
        A: Serialize + ?Sized,
    {
        Ok(serde_json::to_string(args)?)
    }

    /// Cached value for `args`, or call `fetch` under the limiter and store its result
    pub async fn get_or_fetch<A, F, Fut, E>(&self, args: &A, fetch: F) -> Result<V, E>
    where
        A: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let ttl = self.cache.ttl();
        self.get_or_fetch_with_ttl(args, |_| ttl, fetch).await
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch) with the TTL chosen from the fetched value
    pub async fn get_or_fetch_with_ttl<A, T, F, Fut, E>(&self, args: &A, ttl_for: T, fetch: F) -> Result<V, E>
    where
        A: Serialize + ?Sized,
        T: FnOnce(&V) -> Duration,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = match Self::cache_key(args) {
            Ok(key) => key,
            Err(e) => {
                warn!("⚠️ Uncacheable call arguments, calling through: {}", e);
                self.limiter.acquire().await;
                return fetch().await;
            }
        };

        if let Some(value) = self.cache.get(&key).await {
            debug!("💾 Cache hit: {}", key);
            return Ok(value);
        }

        self.limiter.acquire().await;
        let value = fetch().await?;
        let ttl = ttl_for(&value);
        self.cache.insert_with_ttl(key, value.clone(), ttl).await;
        Ok(value)
    }

    /// Rate limit a call whose result must not be cached
    pub async fn throttle<F, Fut, T>(&self, call: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.limiter.acquire().await;
        call().await
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.len().await
    }

    pub async fn clear(&self) {
        self.cache.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_limiter_never_exceeds_window() {
        let limiter = Arc::new(SlidingWindowLimiter::new(3, Duration::from_secs(10)));
        let start = Instant::now();
        let mut stamps = Vec::new();

        for _ in 0..10 {
            limiter.acquire().await;
            stamps.push(Instant::now().duration_since(start));
        }

        for i in 3..stamps.len() {
            assert!(
                stamps[i] - stamps[i - 3] >= Duration::from_secs(10),
                "calls {} and {} share a window",
                i - 3,
                i
            );
        }
        assert_eq!(stamps[0], Duration::ZERO);
        assert_eq!(stamps[3], Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_concurrent_callers() {
        let limiter = Arc::new(SlidingWindowLimiter::new(2, Duration::from_secs(1)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now().duration_since(start)
            }));
        }

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();

        for i in 2..stamps.len() {
            assert!(stamps[i] - stamps[i - 2] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_cache_expiry() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60), 10);
        cache.insert("a".to_string(), 1).await;

        assert_eq!(cache.get(&"a".to_string()).await, Some(1));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_cache_values_not_replaced() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60), 10);
        cache.insert("a", 1).await;
        cache.insert("a", 2).await;
        assert_eq!(cache.get(&"a").await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_cache_capacity_evicts_soonest_expiry() {
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_secs(60), 2);
        cache.insert_with_ttl(1, 1, Duration::from_secs(5)).await;
        cache.insert_with_ttl(2, 2, Duration::from_secs(50)).await;
        cache.insert_with_ttl(3, 3, Duration::from_secs(50)).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&1).await, None);
        assert_eq!(cache.get(&2).await, Some(2));
        assert_eq!(cache.get(&3).await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_cache_calls_once_within_ttl() {
        let limiter = Arc::new(SlidingWindowLimiter::new(100, Duration::from_secs(60)));
        let cache: RateLimitedCache<String> = RateLimitedCache::new(limiter, Duration::from_secs(3600), 100);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<String, String> = cache
                .get_or_fetch(&("album", "Low", "Long Division"), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("hit".to_string())
                })
                .await;
            assert_eq!(value.unwrap(), "hit");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3601)).await;
        let _: Result<String, String> = cache
            .get_or_fetch(&("album", "Low", "Long Division"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("fresh".to_string())
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_cache_never_stores_errors() {
        let limiter = Arc::new(SlidingWindowLimiter::new(100, Duration::from_secs(60)));
        let cache: RateLimitedCache<u32> = RateLimitedCache::new(limiter, Duration::from_secs(3600), 100);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: Result<u32, &str> = cache
                .get_or_fetch("key", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("boom")
                })
                .await;
            assert!(result.is_err());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_entries().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_limiter_spans_caches() {
        let limiter = Arc::new(SlidingWindowLimiter::new(1, Duration::from_secs(5)));
        let searches: RateLimitedCache<u32> = RateLimitedCache::new(limiter.clone(), Duration::from_secs(60), 10);
        let details: RateLimitedCache<u32> = RateLimitedCache::new(limiter.clone(), Duration::from_secs(60), 10);
        let start = Instant::now();

        let _: Result<u32, ()> = searches.get_or_fetch("a", || async { Ok(1) }).await;
        let _: Result<u32, ()> = details.get_or_fetch("b", || async { Ok(2) }).await;

        assert!(Instant::now().duration_since(start) >= Duration::from_secs(5));
    }
}
