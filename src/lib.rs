pub mod cache;
pub mod data;
pub mod error;
pub mod exchange;
pub mod market;
pub mod resolver;
pub mod snapshot;
pub mod strategy;
pub mod utils;

// Re-export commonly used types
pub use data::{
    BiasLabel, CandleBar, EntryPlan, FeatureSet, OrderBookSnapshot, PriceLevel, SignalRecord,
    SkipReason, SkippedSymbol, Snapshot, Ticker, TradingPair, WhaleSet,
};
pub use error::{ProviderError, SignalError};
pub use exchange::{KrakenRestClient, MarketDataProvider};
pub use market::MarketDataService;
pub use resolver::{MetadataCache, PairResolver};
pub use snapshot::SnapshotEngine;
pub use strategy::{classify, compute_features, extract_whales, plan_entry};
pub use utils::Config;
