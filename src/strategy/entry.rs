use crate::data::{BiasLabel, EntryPlan};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Volatility multipliers for zone, stop and far target. K1 < K2 < K3.
pub const K1: Decimal = dec!(0.5);
pub const K2: Decimal = dec!(1.5);
pub const K3: Decimal = dec!(2.5);

/// Near edge of the entry zone as a fraction of the K1 offset.
const ZONE_NEAR: Decimal = dec!(0.3);

/// Propose an entry zone, stop and targets for a non-HOLD bias.
///
/// Returns `None` for HOLD or zero volatility - there is nothing to size
/// the levels with. The SELL side is the mirror image of BUY. Whenever a
/// plan is returned its risk/reward is strictly positive.
pub fn plan_entry(label: BiasLabel, price: Decimal, volatility: Decimal) -> Option<EntryPlan> {
    if volatility <= Decimal::ZERO {
        return None;
    }

    let near = K1 * volatility * ZONE_NEAR;
    let (zone, stop, targets) = match label {
        BiasLabel::Hold => return None,
        BiasLabel::Buy => (
            (price - K1 * volatility, price - near),
            price - K2 * volatility,
            [price + K2 * volatility, price + K3 * volatility],
        ),
        BiasLabel::Sell => (
            (price + near, price + K1 * volatility),
            price + K2 * volatility,
            [price - K2 * volatility, price - K3 * volatility],
        ),
    };

    let reward = (targets[0] - price).abs();
    let risk = (stop - price).abs();
    let risk_reward = (reward / risk).to_f64().unwrap_or(0.0);

    Some(EntryPlan {
        zone,
        stop,
        targets,
        risk_reward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_hold_has_no_plan() {
        assert!(plan_entry(BiasLabel::Hold, dec!(100), dec!(5)).is_none());
    }

    #[test]
    fn test_zero_volatility_has_no_plan() {
        assert!(plan_entry(BiasLabel::Buy, dec!(100), dec!(0)).is_none());
    }

    #[test]
    fn test_buy_plan_levels() {
        let plan = plan_entry(BiasLabel::Buy, dec!(100), dec!(4)).unwrap();

        assert_eq!(plan.zone, (dec!(98.0), dec!(99.4)));
        assert_eq!(plan.stop, dec!(94.0));
        assert_eq!(plan.targets, [dec!(106.0), dec!(110.0)]);
        assert!(plan.risk_reward > 0.0);
    }

    #[test]
    fn test_sell_plan_mirrors_buy() {
        let buy = plan_entry(BiasLabel::Buy, dec!(100), dec!(4)).unwrap();
        let sell = plan_entry(BiasLabel::Sell, dec!(100), dec!(4)).unwrap();

        // Zone sits above price, stop above, targets below.
        assert_eq!(sell.zone, (dec!(100.6), dec!(102.0)));
        assert_eq!(sell.stop, dec!(106.0));
        assert_eq!(sell.targets, [dec!(94.0), dec!(90.0)]);

        // Mirror symmetry around the price.
        assert_eq!(dec!(100) - buy.stop, sell.stop - dec!(100));
        assert_eq!(buy.targets[1] - dec!(100), dec!(100) - sell.targets[1]);
    }

    #[test]
    fn test_zone_is_ordered_low_to_high() {
        for label in [BiasLabel::Buy, BiasLabel::Sell] {
            let plan = plan_entry(label, dec!(250), dec!(3)).unwrap();
            assert!(plan.zone.0 < plan.zone.1);
        }
    }

    #[test]
    fn test_risk_reward_positive_whenever_planned() {
        for vol in [dec!(0.001), dec!(1), dec!(50)] {
            let plan = plan_entry(BiasLabel::Buy, dec!(1000), vol).unwrap();
            assert!(plan.risk_reward > 0.0);
        }
    }
}
