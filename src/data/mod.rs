pub mod types;

pub use types::{
    BiasLabel, CandleBar, EntryPlan, FeatureSet, OrderBookSnapshot, PriceLevel, SignalRecord,
    SkipReason, SkippedSymbol, Snapshot, Ticker, TradingPair, WhaleSet,
};
