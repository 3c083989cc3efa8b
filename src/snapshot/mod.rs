use crate::data::{SignalRecord, SkipReason, SkippedSymbol, Snapshot};
use crate::error::SignalError;
use crate::exchange::MarketDataProvider;
use crate::market::MarketDataService;
use crate::resolver::{MetadataCache, PairResolver};
use crate::strategy::{classify, compute_features, extract_whales, plan_entry};
use crate::utils::Config;
use chrono::Utc;
use futures_util::future::join_all;
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Drives the full per-symbol pipeline and owns the published snapshot.
///
/// Construction is the only place `ConfigInvalid` can surface; after that
/// no per-symbol error ever escapes `compute_snapshot` - every failure
/// lands in the skip list and the rest of the batch proceeds.
pub struct SnapshotEngine {
    config: Config,
    resolver: PairResolver,
    market: MarketDataService,

    /// Last published snapshot. Built fully off to the side, then swapped
    /// in whole; readers never see a partial value.
    last: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotEngine {
    pub fn new(config: Config, provider: Arc<dyn MarketDataProvider>) -> Result<Self, SignalError> {
        config.validate()?;

        let metadata = MetadataCache::new(
            Arc::clone(&provider),
            Duration::from_secs(config.cache.metadata_ttl_secs),
        );
        let market = MarketDataService::new(
            provider,
            Duration::from_secs(config.cache.market_data_ttl_secs),
        );

        Ok(Self {
            config,
            resolver: PairResolver::new(metadata),
            market,
            last: RwLock::new(None),
        })
    }

    /// Compute one ranked snapshot over the configured universe.
    ///
    /// Symbols fan out in parallel; each pipeline is bounded by the
    /// snapshot deadline, so one stuck fetch can't hold the batch hostage.
    pub async fn compute_snapshot(&self) -> Arc<Snapshot> {
        let deadline = Duration::from_secs_f64(self.config.snapshot_deadline_secs);

        let tasks = self.config.universe.iter().map(|symbol| {
            let symbol = symbol.to_uppercase();
            async move {
                let outcome = timeout(deadline, self.process_symbol(&symbol)).await;
                match outcome {
                    Ok(Ok(record)) => Ok(record),
                    Ok(Err(err)) => Err(SkippedSymbol {
                        symbol,
                        reason: skip_reason(err),
                    }),
                    Err(_) => Err(SkippedSymbol {
                        symbol,
                        reason: SkipReason::DataUnavailable {
                            feed: "pipeline".to_string(),
                            detail: "deadline exceeded".to_string(),
                        },
                    }),
                }
            }
        });

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for result in join_all(tasks).await {
            match result {
                Ok(record) => records.push(record),
                Err(skip) => {
                    warn!(symbol = %skip.symbol, reason = %skip.reason, "symbol skipped");
                    skipped.push(skip);
                }
            }
        }

        // Total order imposed only after the full fan-out: strongest score
        // on the deepest book first, for the "top movers" view.
        records.sort_by(|a, b| {
            ranking_key(b)
                .partial_cmp(&ranking_key(a))
                .unwrap_or(Ordering::Equal)
        });

        let snapshot = Arc::new(Snapshot {
            records,
            skipped,
            generated_at: Utc::now(),
        });

        info!(
            records = snapshot.records.len(),
            skipped = snapshot.skipped.len(),
            "snapshot computed"
        );

        *self.last.write().expect("snapshot lock poisoned") = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Non-blocking read of the last published snapshot.
    pub fn last_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.last.read().ok().and_then(|guard| guard.clone())
    }

    async fn process_symbol(&self, symbol: &str) -> Result<SignalRecord, SignalError> {
        let pair = self
            .resolver
            .resolve(symbol, &self.config.quote_preferences)
            .await?;

        // The three feeds are independent; fetch them concurrently.
        let (ticker, depth, candles) = tokio::join!(
            self.market.ticker(&pair.pair_key),
            self.market.depth(&pair.pair_key, self.config.depth_level_count),
            self.market.candles(
                &pair.pair_key,
                self.config.candles.interval_secs,
                self.config.candles.bar_count,
            ),
        );
        let (ticker, depth, candles) = (ticker?, depth?, candles?);

        let whale = &self.config.whale;
        let bid_whales = extract_whales(&depth.bids, whale.usd_floor, whale.cap_count);
        let ask_whales = extract_whales(&depth.asks, whale.usd_floor, whale.cap_count);

        let features = compute_features(
            &candles,
            self.config.candles.momentum_lookback,
            self.config.candles.volatility_window,
        );

        let call = classify(
            bid_whales.side_total_usd,
            ask_whales.side_total_usd,
            features.momentum,
            &self.config.bias.weights,
            &self.config.bias.thresholds,
        );

        let entry = plan_entry(call.label, ticker.last_price, features.volatility);

        Ok(SignalRecord {
            symbol: symbol.to_string(),
            pair,
            price: ticker.last_price,
            bid_whales,
            ask_whales,
            features,
            bias: call.label,
            score: call.score,
            rationale: call.rationale,
            entry,
        })
    }
}

fn skip_reason(err: SignalError) -> SkipReason {
    match err {
        SignalError::PairNotFound { .. } => SkipReason::PairNotFound,
        SignalError::DataUnavailable { feed, source, .. } => SkipReason::DataUnavailable {
            feed: feed.to_string(),
            detail: source.to_string(),
        },
        // ConfigInvalid is rejected at construction and cannot reach here;
        // record it rather than panic if it ever does.
        SignalError::ConfigInvalid(msg) => SkipReason::DataUnavailable {
            feed: "config".to_string(),
            detail: msg,
        },
    }
}

/// |score| weighted by the heavier book side.
fn ranking_key(record: &SignalRecord) -> f64 {
    let side_max = record
        .bid_whales
        .side_total_usd
        .max(record.ask_whales.side_total_usd)
        .to_f64()
        .unwrap_or(0.0);
    record.score.abs() * side_max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BiasLabel, FeatureSet, TradingPair, WhaleSet};
    use rust_decimal_macros::dec;

    fn record(symbol: &str, score: f64, bid_total: rust_decimal::Decimal) -> SignalRecord {
        SignalRecord {
            symbol: symbol.to_string(),
            pair: TradingPair {
                symbol: symbol.to_string(),
                base_alt: symbol.to_string(),
                quote: "USD".to_string(),
                pair_key: format!("{}USD", symbol),
                altname: format!("{}USD", symbol),
            },
            price: dec!(100),
            bid_whales: WhaleSet {
                levels: vec![],
                side_total_usd: bid_total,
            },
            ask_whales: WhaleSet {
                levels: vec![],
                side_total_usd: dec!(0),
            },
            features: FeatureSet {
                momentum: dec!(0),
                volatility: dec!(0),
            },
            bias: BiasLabel::Hold,
            score,
            rationale: String::new(),
            entry: None,
        }
    }

    #[test]
    fn test_ranking_key_weighs_score_by_depth() {
        // Weak signal on a deep book can outrank a strong one on a thin book.
        let deep = record("A", 0.3, dec!(1000000));
        let thin = record("B", 0.9, dec!(10000));

        assert!(ranking_key(&deep) > ranking_key(&thin));
    }

    #[test]
    fn test_ranking_key_uses_absolute_score() {
        let sell = record("A", -0.8, dec!(100000));
        let buy = record("B", 0.4, dec!(100000));

        assert!(ranking_key(&sell) > ranking_key(&buy));
    }

    // End-to-end orchestration tests with a mock provider live in
    // tests/engine.rs.
}
