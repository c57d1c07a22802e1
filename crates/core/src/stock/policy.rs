//! Bag conversion.

use rust_decimal::Decimal;
use tally_shared::config::StockConfig;

/// Bag weight used when nothing is configured.
pub const DEFAULT_BAG_WEIGHT_KG: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// How kilograms on a line become bags of stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockPolicy {
    bag_weight_kg: Decimal,
}

impl StockPolicy {
    /// Creates a policy. Non-positive weights fall back to the default.
    #[must_use]
    pub fn new(bag_weight_kg: Decimal) -> Self {
        if bag_weight_kg > Decimal::ZERO {
            Self { bag_weight_kg }
        } else {
            Self::default()
        }
    }

    /// Builds the policy from the `stock` config section.
    #[must_use]
    pub fn from_config(config: &StockConfig) -> Self {
        Self::new(config.bag_weight_kg)
    }

    /// Weight of one bag in kilograms.
    #[must_use]
    pub const fn bag_weight_kg(&self) -> Decimal {
        self.bag_weight_kg
    }

    /// Bags moved by one line: `ceil(kg / bag_weight_kg)`.
    #[must_use]
    pub fn bags_for(&self, quantity_kg: Decimal) -> Decimal {
        (quantity_kg / self.bag_weight_kg).ceil()
    }
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            bag_weight_kg: DEFAULT_BAG_WEIGHT_KG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(90), dec!(3))]
    #[case(dec!(91), dec!(4))]
    #[case(dec!(0.5), dec!(1))]
    #[case(dec!(30), dec!(1))]
    #[case(dec!(60.001), dec!(3))]
    fn test_bags_round_up(#[case] kg: Decimal, #[case] bags: Decimal) {
        assert_eq!(StockPolicy::default().bags_for(kg), bags);
    }

    #[test]
    fn test_custom_weight() {
        let policy = StockPolicy::new(dec!(50));
        assert_eq!(policy.bags_for(dec!(120)), dec!(3));
    }

    #[test]
    fn test_non_positive_weight_falls_back() {
        assert_eq!(StockPolicy::new(dec!(0)).bag_weight_kg(), DEFAULT_BAG_WEIGHT_KG);
        assert_eq!(StockPolicy::new(dec!(-5)).bag_weight_kg(), DEFAULT_BAG_WEIGHT_KG);
    }
}
