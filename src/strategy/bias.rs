use crate::data::BiasLabel;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Guards the imbalance denominator when both sides are empty.
pub const EPSILON: f64 = 1e-9;

/// Fixed multiplier that brings momentum into the imbalance's [-1, 1]
/// range before weighting: a 10% move saturates the momentum term.
pub const MOMENTUM_SCALE: f64 = 10.0;

/// Blend weights for the two score contributors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BiasWeights {
    pub book: f64,
    pub momentum: f64,
}

/// Process-wide label cut-offs; `low` is negative, validated at startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BiasThresholds {
    pub high: f64,
    pub low: f64,
}

/// Classifier output: label, bounded score, and a deterministic rationale
/// generated from the same inputs.
#[derive(Debug, Clone)]
pub struct BiasCall {
    pub label: BiasLabel,
    pub score: f64,
    pub imbalance: f64,
    pub rationale: String,
}

/// Combine order-book imbalance and momentum into a bounded score.
///
/// Identical inputs always yield identical labels: the weights and
/// thresholds are fixed for the process lifetime and every step here is
/// pure arithmetic.
pub fn classify(
    bid_total_usd: Decimal,
    ask_total_usd: Decimal,
    momentum: Decimal,
    weights: &BiasWeights,
    thresholds: &BiasThresholds,
) -> BiasCall {
    let bid = bid_total_usd.to_f64().unwrap_or(0.0);
    let ask = ask_total_usd.to_f64().unwrap_or(0.0);

    let imbalance = (bid - ask) / (bid + ask).max(EPSILON);

    let momentum_raw = momentum.to_f64().unwrap_or(0.0);
    let momentum_scaled = (momentum_raw * MOMENTUM_SCALE).clamp(-1.0, 1.0);

    let book_term = weights.book * imbalance;
    let momentum_term = weights.momentum * momentum_scaled;
    let score = (book_term + momentum_term).clamp(-1.0, 1.0);

    let label = if score > thresholds.high {
        BiasLabel::Buy
    } else if score < thresholds.low {
        BiasLabel::Sell
    } else {
        BiasLabel::Hold
    };

    let rationale = build_rationale(label, imbalance, momentum_raw, book_term, momentum_term, bid, ask);

    BiasCall {
        label,
        score,
        imbalance,
        rationale,
    }
}

/// Short textual summary citing the dominant contributor and raw totals.
fn build_rationale(
    label: BiasLabel,
    imbalance: f64,
    momentum_raw: f64,
    book_term: f64,
    momentum_term: f64,
    bid: f64,
    ask: f64,
) -> String {
    let book_led = book_term.abs() >= momentum_term.abs();

    if book_led {
        match label {
            BiasLabel::Buy => format!(
                "Bid pressure {:.0}% higher (bids ${} vs asks ${}).",
                imbalance * 100.0,
                format_usd(bid),
                format_usd(ask)
            ),
            BiasLabel::Sell => format!(
                "Ask pressure {:.0}% higher (asks ${} vs bids ${}).",
                imbalance.abs() * 100.0,
                format_usd(ask),
                format_usd(bid)
            ),
            BiasLabel::Hold => format!(
                "Balanced book (bids ${} vs asks ${}).",
                format_usd(bid),
                format_usd(ask)
            ),
        }
    } else {
        format!(
            "Momentum {:+.1}% leads the book (bids ${} vs asks ${}).",
            momentum_raw * 100.0,
            format_usd(bid),
            format_usd(ask)
        )
    }
}

/// Whole-dollar amount with thousands separators, e.g. 300000 -> "300,000".
fn format_usd(amount: f64) -> String {
    let whole = amount.round().abs() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const WEIGHTS: BiasWeights = BiasWeights {
        book: 1.0,
        momentum: 0.0,
    };
    const THRESHOLDS: BiasThresholds = BiasThresholds {
        high: 0.2,
        low: -0.2,
    };

    #[test]
    fn test_bid_heavy_book_is_buy() {
        // bids $300k vs asks $100k -> imbalance 0.5
        let call = classify(dec!(300000), dec!(100000), dec!(0), &WEIGHTS, &THRESHOLDS);

        assert!((call.imbalance - 0.5).abs() < 1e-12);
        assert_eq!(call.label, BiasLabel::Buy);
        assert_eq!(
            call.rationale,
            "Bid pressure 50% higher (bids $300,000 vs asks $100,000)."
        );
    }

    #[test]
    fn test_balanced_book_is_hold() {
        let call = classify(dec!(100000), dec!(100000), dec!(0), &WEIGHTS, &THRESHOLDS);

        assert_eq!(call.imbalance, 0.0);
        assert_eq!(call.score, 0.0);
        assert_eq!(call.label, BiasLabel::Hold);
        assert_eq!(
            call.rationale,
            "Balanced book (bids $100,000 vs asks $100,000)."
        );
    }

    #[test]
    fn test_ask_heavy_book_is_sell() {
        let call = classify(dec!(100000), dec!(300000), dec!(0), &WEIGHTS, &THRESHOLDS);

        assert_eq!(call.label, BiasLabel::Sell);
        assert_eq!(
            call.rationale,
            "Ask pressure 50% higher (asks $300,000 vs bids $100,000)."
        );
    }

    #[test]
    fn test_empty_book_does_not_divide_by_zero() {
        let call = classify(dec!(0), dec!(0), dec!(0), &WEIGHTS, &THRESHOLDS);

        assert_eq!(call.imbalance, 0.0);
        assert_eq!(call.label, BiasLabel::Hold);
    }

    #[test]
    fn test_score_is_always_bounded() {
        let heavy = BiasWeights {
            book: 5.0,
            momentum: 5.0,
        };
        let call = classify(dec!(900000), dec!(1), dec!(0.5), &heavy, &THRESHOLDS);
        assert!(call.score <= 1.0);

        let call = classify(dec!(1), dec!(900000), dec!(-0.5), &heavy, &THRESHOLDS);
        assert!(call.score >= -1.0);
    }

    #[test]
    fn test_momentum_dominant_rationale() {
        let weights = BiasWeights {
            book: 0.5,
            momentum: 0.5,
        };
        // Flat book, strong positive momentum.
        let call = classify(dec!(100000), dec!(100000), dec!(0.08), &weights, &THRESHOLDS);

        assert_eq!(call.label, BiasLabel::Buy);
        assert_eq!(
            call.rationale,
            "Momentum +8.0% leads the book (bids $100,000 vs asks $100,000)."
        );
    }

    #[test]
    fn test_momentum_scaling_saturates() {
        let weights = BiasWeights {
            book: 0.0,
            momentum: 1.0,
        };
        // 50% move scales past 1.0 and must clamp, not overshoot.
        let call = classify(dec!(0), dec!(0), dec!(0.5), &weights, &THRESHOLDS);
        assert_eq!(call.score, 1.0);
    }

    #[test]
    fn test_identical_inputs_identical_output() {
        let a = classify(dec!(250000), dec!(120000), dec!(0.01), &WEIGHTS, &THRESHOLDS);
        let b = classify(dec!(250000), dec!(120000), dec!(0.01), &WEIGHTS, &THRESHOLDS);

        assert_eq!(a.label, b.label);
        assert_eq!(a.score, b.score);
        assert_eq!(a.rationale, b.rationale);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "0");
        assert_eq!(format_usd(999.0), "999");
        assert_eq!(format_usd(1000.0), "1,000");
        assert_eq!(format_usd(1234567.0), "1,234,567");
    }
}
