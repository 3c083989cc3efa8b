use crate::data::{CandleBar, FeatureSet};
use rust_decimal::Decimal;

/// Derive momentum and volatility from a time-ascending candle series.
pub fn compute_features(
    candles: &[CandleBar],
    momentum_lookback: usize,
    volatility_window: usize,
) -> FeatureSet {
    FeatureSet {
        momentum: momentum(candles, momentum_lookback),
        volatility: mean_true_range(candles, volatility_window),
    }
}

/// Relative close-price change over `lookback` bars.
///
/// Zero when the series is too short or the reference close is zero.
fn momentum(candles: &[CandleBar], lookback: usize) -> Decimal {
    if lookback == 0 || candles.len() < lookback + 1 {
        return Decimal::ZERO;
    }

    let last = candles[candles.len() - 1].close;
    let reference = candles[candles.len() - 1 - lookback].close;
    if reference.is_zero() {
        return Decimal::ZERO;
    }

    (last - reference) / reference
}

/// Mean true range over the most recent `window` bars.
///
/// TR(i) = max(high-low, |high - prev_close|, |low - prev_close|); the
/// first bar has no previous close, so a two-bar series yields one TR.
/// Zero when fewer than 2 bars exist.
fn mean_true_range(candles: &[CandleBar], window: usize) -> Decimal {
    if window == 0 || candles.len() < 2 {
        return Decimal::ZERO;
    }

    let start = candles.len().saturating_sub(window).max(1);
    let ranges: Vec<Decimal> = (start..candles.len())
        .map(|i| {
            let prev_close = candles[i - 1].close;
            let hl = candles[i].high - candles[i].low;
            let hc = (candles[i].high - prev_close).abs();
            let lc = (candles[i].low - prev_close).abs();
            hl.max(hc).max(lc)
        })
        .collect();

    let sum: Decimal = ranges.iter().copied().sum();
    sum / Decimal::from(ranges.len() as u64)
}
