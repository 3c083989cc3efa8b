use crate::error::ProviderError;
use dashmap::DashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Per-key cached value with its fetch time.
struct Slot<V> {
    value: Option<V>,
    fetched_at: Instant,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            value: None,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.value.is_some() && self.fetched_at.elapsed() < ttl
    }
}

/// TTL cache with single-flight refresh.
///
/// Each key owns an async mutex around its slot. A caller that finds the
/// slot expired refreshes it while holding the lock, so concurrent callers
/// for the same key queue behind the fetch and observe the fresh entry
/// instead of issuing duplicate upstream calls - this is what keeps the
/// engine inside the venue's rate limits.
///
/// With `with_stale_fallback` a failed refresh serves the previous value
/// and logs a warning instead of failing the caller. Only the metadata
/// cache opts in; market-data caches never serve past their TTL.
pub struct TtlCache<K, V> {
    slots: DashMap<K, Arc<Mutex<Slot<V>>>>,
    ttl: Duration,
    serve_stale_on_error: bool,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            serve_stale_on_error: false,
        }
    }

    /// Keep returning the previous value when a refresh fails.
    pub fn with_stale_fallback(mut self) -> Self {
        self.serve_stale_on_error = true;
        self
    }

    /// Return the cached value for `key`, refreshing through `fetch` if
    /// the entry is missing or expired.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, ProviderError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ProviderError>>,
    {
        // Clone the slot handle out so the map shard lock is released
        // before awaiting.
        let slot = self
            .slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Slot::empty())))
            .clone();

        let mut guard = slot.lock().await;

        if guard.is_fresh(self.ttl) {
            return Ok(guard.value.clone().expect("fresh slot has a value"));
        }

        match fetch().await {
            Ok(value) => {
                guard.value = Some(value.clone());
                guard.fetched_at = Instant::now();
                Ok(value)
            }
            Err(err) => {
                if self.serve_stale_on_error {
                    if let Some(stale) = guard.value.clone() {
                        warn!(?key, error = %err, "refresh failed, serving stale value");
                        return Ok(stale);
                    }
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fresh_entry_skips_fetch() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_fetch("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(v, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::ZERO);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_fetch("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stale_fallback_serves_old_value() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::ZERO).with_stale_fallback();

        cache.get_or_fetch("k", || async { Ok(42) }).await.unwrap();

        // TTL is zero, so the next access refreshes and fails; the old
        // value must still come back.
        let v = cache
            .get_or_fetch("k", || async { Err(ProviderError::RateLimited) })
            .await
            .unwrap();
        assert_eq!(v, 42);
    }

    #[tokio::test]
    async fn test_error_propagates_without_fallback() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::ZERO);

        cache.get_or_fetch("k", || async { Ok(42) }).await.unwrap();

        let err = cache
            .get_or_fetch("k", || async { Err(ProviderError::RateLimited) })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
    }

    #[tokio::test]
    async fn test_concurrent_callers_collapse_into_one_fetch() {
        let cache: Arc<TtlCache<&str, u32>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("k", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(9)
                    })
                    .await
                    .unwrap()
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), 9);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
