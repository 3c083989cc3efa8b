pub mod kraken;

pub use kraken::KrakenRestClient;

use crate::data::{CandleBar, OrderBookSnapshot, Ticker};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Abstracted upstream market-data venue.
///
/// The engine only ever talks to this trait, so tests can swap in a mock
/// with canned payloads and call counters. All methods return already
/// validated, strongly typed values; shape mismatches surface as
/// `ProviderError::Malformed` inside the implementation.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Altnames of every listed asset, uppercased.
    async fn asset_altnames(&self) -> Result<HashSet<String>, ProviderError>;

    /// Pair directory: pair altname (e.g. "XBTUSD") -> venue pair key.
    async fn pair_directory(&self) -> Result<HashMap<String, String>, ProviderError>;

    async fn ticker(&self, pair_key: &str) -> Result<Ticker, ProviderError>;

    async fn depth(&self, pair_key: &str, count: u32) -> Result<OrderBookSnapshot, ProviderError>;

    /// Most recent `bars` candles of `interval_secs` width, time-ascending.
    async fn candles(
        &self,
        pair_key: &str,
        interval_secs: u32,
        bars: usize,
    ) -> Result<Vec<CandleBar>, ProviderError>;
}
