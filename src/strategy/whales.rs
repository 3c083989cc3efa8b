use crate::data::{PriceLevel, WhaleSet};
use rust_decimal::Decimal;

/// Filter one book side down to its whale levels.
///
/// Pure function: `side_total_usd` sums EVERY input level so the
/// imbalance always reflects the whole side, while the returned levels
/// keep only entries whose notional clears `usd_floor`, sorted descending
/// by notional and truncated to `cap_count`.
pub fn extract_whales(levels: &[PriceLevel], usd_floor: Decimal, cap_count: usize) -> WhaleSet {
    let side_total_usd: Decimal = levels.iter().map(|l| l.notional_usd()).sum();

    let mut whales: Vec<PriceLevel> = levels
        .iter()
        .copied()
        .filter(|l| l.notional_usd() >= usd_floor)
        .collect();

    whales.sort_by(|a, b| b.notional_usd().cmp(&a.notional_usd()));
    whales.truncate(cap_count);

    WhaleSet {
        levels: whales,
        side_total_usd,
    }
}
