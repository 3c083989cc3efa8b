use crate::cache::TtlCache;
use crate::data::{CandleBar, OrderBookSnapshot, Ticker};
use crate::error::{ProviderError, SignalError};
use crate::exchange::MarketDataProvider;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Pause before the single retry. Long enough for a rate-limit window to
/// roll over, short enough not to blow the snapshot deadline.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// One uniform retry policy for every feed: a transient failure gets
/// exactly one more attempt after a fixed backoff, everything else
/// surfaces immediately.
async fn with_retry<T, F, Fut>(op: F) -> Result<T, ProviderError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(err) if err.is_transient() => {
            warn!(error = %err, "transient upstream failure, retrying once");
            sleep(RETRY_BACKOFF).await;
            op().await
        }
        Err(err) => Err(err),
    }
}

/// The three market-data feeds, cached per parameter tuple.
///
/// Each feed keeps its own short-TTL single-flight cache, so a burst of
/// snapshot computations within one TTL window costs at most one upstream
/// call per distinct (feed, pair, params) key. Unlike the metadata cache,
/// these never serve stale data: an expired entry that fails to refresh is
/// `DataUnavailable`.
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    tickers: TtlCache<String, Ticker>,
    depths: TtlCache<(String, u32), OrderBookSnapshot>,
    candles: TtlCache<(String, u32, usize), Arc<Vec<CandleBar>>>,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            tickers: TtlCache::new(ttl),
            depths: TtlCache::new(ttl),
            candles: TtlCache::new(ttl),
        }
    }

    /// Last and session-open price for one pair.
    pub async fn ticker(&self, pair_key: &str) -> Result<Ticker, SignalError> {
        let provider = Arc::clone(&self.provider);
        let pair = pair_key.to_string();
        self.tickers
            .get_or_fetch(pair.clone(), {
                let pair = pair.clone();
                move || async move { with_retry(|| provider.ticker(&pair)).await }
            })
            .await
            .map_err(|source| SignalError::DataUnavailable {
                feed: "ticker",
                pair,
                source,
            })
    }

    /// Order book snapshot, top `level_count` levels per side.
    pub async fn depth(
        &self,
        pair_key: &str,
        level_count: u32,
    ) -> Result<OrderBookSnapshot, SignalError> {
        let provider = Arc::clone(&self.provider);
        let pair = pair_key.to_string();
        self.depths
            .get_or_fetch((pair.clone(), level_count), {
                let pair = pair.clone();
                move || async move { with_retry(|| provider.depth(&pair, level_count)).await }
            })
            .await
            .map_err(|source| SignalError::DataUnavailable {
                feed: "depth",
                pair,
                source,
            })
    }

    /// Most recent `bars` candles, time-ascending.
    pub async fn candles(
        &self,
        pair_key: &str,
        interval_secs: u32,
        bars: usize,
    ) -> Result<Arc<Vec<CandleBar>>, SignalError> {
        let provider = Arc::clone(&self.provider);
        let pair = pair_key.to_string();
        self.candles
            .get_or_fetch((pair.clone(), interval_secs, bars), {
                let pair = pair.clone();
                move || async move {
                    with_retry(|| provider.candles(&pair, interval_secs, bars))
                        .await
                        .map(Arc::new)
                }
            })
            .await
            .map_err(|source| SignalError::DataUnavailable {
                feed: "candles",
                pair,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `fail_first` ticker calls, then succeeds.
    struct FlakyProvider {
        fail_first: usize,
        error: ProviderError,
        calls: AtomicUsize,
    }

    impl FlakyProvider {
        fn new(fail_first: usize, error: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                fail_first,
                error,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MarketDataProvider for FlakyProvider {
        async fn asset_altnames(&self) -> Result<HashSet<String>, ProviderError> {
            Ok(HashSet::new())
        }

        async fn pair_directory(&self) -> Result<HashMap<String, String>, ProviderError> {
            Ok(HashMap::new())
        }

        async fn ticker(&self, _pair_key: &str) -> Result<Ticker, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(self.error.clone())
            } else {
                Ok(Ticker {
                    last_price: dec!(100),
                    open_price: dec!(95),
                })
            }
        }

        async fn depth(&self, _: &str, _: u32) -> Result<OrderBookSnapshot, ProviderError> {
            Ok(OrderBookSnapshot {
                bids: vec![],
                asks: vec![],
                fetched_at: Utc::now(),
            })
        }

        async fn candles(&self, _: &str, _: u32, _: usize) -> Result<Vec<CandleBar>, ProviderError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_once() {
        let provider = FlakyProvider::new(1, ProviderError::RateLimited);
        let service = MarketDataService::new(provider.clone(), Duration::from_secs(5));

        let ticker = service.ticker("XBTUSD").await.unwrap();
        assert_eq!(ticker.last_price, dec!(100));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_failure_is_data_unavailable() {
        let provider = FlakyProvider::new(2, ProviderError::Network("timeout".into()));
        let service = MarketDataService::new(provider.clone(), Duration::from_secs(5));

        let err = service.ticker("XBTUSD").await.unwrap_err();
        assert!(matches!(
            err,
            SignalError::DataUnavailable { feed: "ticker", .. }
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_structural_failure_is_not_retried() {
        let provider = FlakyProvider::new(usize::MAX, ProviderError::NotFound);
        let service = MarketDataService::new(provider.clone(), Duration::from_secs(5));

        service.ticker("NOPE").await.unwrap_err();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_within_ttl() {
        let provider = FlakyProvider::new(0, ProviderError::NotFound);
        let service = MarketDataService::new(provider.clone(), Duration::from_secs(60));

        service.ticker("XBTUSD").await.unwrap();
        service.ticker("XBTUSD").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // A different pair is a different cache key.
        service.ticker("ETHUSD").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
