use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved venue trading pair for one logical symbol.
///
/// Immutable once resolved for a cache window. `pair_key` is the venue's
/// internal pair identifier (e.g. "XXBTZUSD"), `altname` the human form
/// ("XBTUSD") the directory is indexed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPair {
    /// Logical symbol as supplied by the caller ("BTC")
    pub symbol: String,

    /// Venue altname of the base asset ("XBT")
    pub base_alt: String,

    /// Quote currency the pair settled on ("USD")
    pub quote: String,

    /// Venue pair key used on the wire
    pub pair_key: String,

    /// Venue pair altname (base_alt + quote)
    pub altname: String,
}

/// One order book level.
///
/// Notional is always recomputed from price and quantity, never stored,
/// so it can't drift from its source level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }

    /// USD-equivalent size of this level: price * quantity, exact.
    pub fn notional_usd(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Order book snapshot: bids descending by price, asks ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub fetched_at: DateTime<Utc>,
}

/// Last trade and session open price for one pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ticker {
    pub last_price: Decimal,
    pub open_price: Decimal,
}

/// One OHLC bucket of fixed width, ascending-time within a series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandleBar {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Whale levels on one book side.
///
/// `levels` hold only entries whose notional cleared the floor, sorted
/// descending by notional and capped; `side_total_usd` sums the ENTIRE
/// input side regardless of the floor - that total feeds the imbalance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleSet {
    pub levels: Vec<PriceLevel>,
    pub side_total_usd: Decimal,
}

/// Momentum and volatility derived from a candle series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Signed fraction: relative close-price change over the lookback
    pub momentum: Decimal,

    /// Mean true range over the volatility window, in price units
    pub volatility: Decimal,
}

/// Discrete trading bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BiasLabel {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for BiasLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiasLabel::Buy => write!(f, "BUY"),
            BiasLabel::Sell => write!(f, "SELL"),
            BiasLabel::Hold => write!(f, "HOLD"),
        }
    }
}

/// Proposed entry zone, stop and targets for a non-HOLD bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPlan {
    /// (low, high) band to enter within
    pub zone: (Decimal, Decimal),
    pub stop: Decimal,
    pub targets: [Decimal; 2],

    /// distance(target1, price) / distance(stop, price), diagnostic
    pub risk_reward: f64,
}

/// Why a symbol was excluded from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    PairNotFound,
    DataUnavailable { feed: String, detail: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PairNotFound => write!(f, "pair not found"),
            SkipReason::DataUnavailable { feed, detail } => {
                write!(f, "{} unavailable: {}", feed, detail)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

/// Fully assembled per-symbol signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub symbol: String,
    pub pair: TradingPair,
    pub price: Decimal,
    pub bid_whales: WhaleSet,
    pub ask_whales: WhaleSet,
    pub features: FeatureSet,
    pub bias: BiasLabel,

    /// Composite bias score in [-1, 1]
    pub score: f64,
    pub rationale: String,
    pub entry: Option<EntryPlan>,
}

/// One ranked pass over the whole universe.
///
/// Always a complete value: whatever succeeded in `records` (ranked
/// descending), everything else in `skipped` with a reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<SignalRecord>,
    pub skipped: Vec<SkippedSymbol>,
    pub generated_at: DateTime<Utc>,
}
