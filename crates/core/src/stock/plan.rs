//! Net stock deltas for a set of lines.
//!
//! A sale takes bags out, a purchase puts them back. Every bag of a
//! non-universal item also moves one bag of the universal packaging item in
//! the same direction. A line naming the universal item moves it by its own
//! bags only.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::policy::StockPolicy;
use crate::ledger::normalize_name;
use crate::records::{LineItem, TransactionKind};

/// Delta for one item in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// Display name as written on the line.
    pub item_name: String,
    /// Signed bag delta.
    pub delta: Decimal,
    /// The item must exist. Set for lines being written; reversals of stored
    /// lines tolerate items that have since been removed.
    pub required: bool,
}

/// Item name key to bag delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockPlan {
    entries: BTreeMap<String, PlanEntry>,
}

impl StockPlan {
    /// Plan for writing `lines` of a record of `kind`.
    ///
    /// `universal` is the display name of the universal item, if one exists.
    /// Payments carry no lines and produce an empty plan.
    #[must_use]
    pub fn for_lines(
        kind: TransactionKind,
        lines: &[LineItem],
        universal: Option<&str>,
        policy: &StockPolicy,
    ) -> Self {
        let sign = match kind {
            TransactionKind::Sale => Decimal::NEGATIVE_ONE,
            TransactionKind::Purchase => Decimal::ONE,
            TransactionKind::Payment => return Self::default(),
        };
        let universal_key = universal.map(normalize_name);

        let mut plan = Self::default();
        let mut packaging = Decimal::ZERO;
        for line in lines {
            let bags = policy.bags_for(line.quantity_kg);
            let key = normalize_name(&line.item_name);
            if universal_key.as_deref() != Some(key.as_str()) {
                packaging += bags;
            }
            plan.add(key, &line.item_name, sign * bags, true);
        }

        if let (Some(key), Some(name)) = (universal_key, universal)
            && !packaging.is_zero()
        {
            plan.add(key, name, sign * packaging, false);
        }
        plan
    }

    /// The same plan with every delta negated and nothing required.
    #[must_use]
    pub fn reversed(mut self) -> Self {
        for entry in self.entries.values_mut() {
            entry.delta = -entry.delta;
            entry.required = false;
        }
        self
    }

    /// Sums two plans item by item.
    #[must_use]
    pub fn combine(mut self, other: Self) -> Self {
        for (key, entry) in other.entries {
            self.add(key, &entry.item_name, entry.delta, entry.required);
        }
        self
    }

    /// Delta for an item name, zero if absent.
    #[must_use]
    pub fn delta_for(&self, item_name: &str) -> Decimal {
        self.entries
            .get(&normalize_name(item_name))
            .map_or(Decimal::ZERO, |e| e.delta)
    }

    /// Entries keyed by lowercased item name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PlanEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if the plan moves nothing and requires nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .values()
            .all(|e| e.delta.is_zero() && !e.required)
    }

    fn add(&mut self, key: String, item_name: &str, delta: Decimal, required: bool) {
        let entry = self.entries.entry(key).or_insert_with(|| PlanEntry {
            item_name: item_name.to_string(),
            delta: Decimal::ZERO,
            required: false,
        });
        entry.delta += delta;
        entry.required |= required;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(name: &str, kg: Decimal) -> LineItem {
        LineItem {
            item_name: name.to_string(),
            quantity_kg: kg,
            rate: dec!(10),
            total: kg * dec!(10),
        }
    }

    #[test]
    fn test_sale_consumes_packaging() {
        let plan = StockPlan::for_lines(
            TransactionKind::Sale,
            &[line("Plastic-A", dec!(90)), line("Plastic-B", dec!(31))],
            Some("Bardana"),
            &StockPolicy::default(),
        );
        assert_eq!(plan.delta_for("plastic-a"), dec!(-3));
        assert_eq!(plan.delta_for("Plastic-B"), dec!(-2));
        assert_eq!(plan.delta_for("Bardana"), dec!(-5));
    }

    #[test]
    fn test_purchase_is_symmetric() {
        let plan = StockPlan::for_lines(
            TransactionKind::Purchase,
            &[line("Plastic-A", dec!(90))],
            Some("Bardana"),
            &StockPolicy::default(),
        );
        assert_eq!(plan.delta_for("Plastic-A"), dec!(3));
        assert_eq!(plan.delta_for("Bardana"), dec!(3));
    }

    #[test]
    fn test_universal_line_moves_only_its_own_bags() {
        let plan = StockPlan::for_lines(
            TransactionKind::Sale,
            &[line("bardana", dec!(60)), line("Plastic-A", dec!(30))],
            Some("Bardana"),
            &StockPolicy::default(),
        );
        assert_eq!(plan.delta_for("Bardana"), dec!(-3));
        assert_eq!(plan.delta_for("Plastic-A"), dec!(-1));
    }

    #[test]
    fn test_no_universal_item() {
        let plan = StockPlan::for_lines(
            TransactionKind::Sale,
            &[line("Plastic-A", dec!(90))],
            None,
            &StockPolicy::default(),
        );
        assert_eq!(plan.entries().count(), 1);
    }

    #[test]
    fn test_payment_plan_is_empty() {
        let plan = StockPlan::for_lines(
            TransactionKind::Payment,
            &[],
            Some("Bardana"),
            &StockPolicy::default(),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_edit_nets_old_against_new() {
        let policy = StockPolicy::default();
        let old = StockPlan::for_lines(
            TransactionKind::Sale,
            &[line("Plastic-A", dec!(90))],
            Some("Bardana"),
            &policy,
        );
        let new = StockPlan::for_lines(
            TransactionKind::Sale,
            &[line("Plastic-A", dec!(120))],
            Some("Bardana"),
            &policy,
        );
        let net = old.reversed().combine(new);
        assert_eq!(net.delta_for("Plastic-A"), dec!(-1));
        assert_eq!(net.delta_for("Bardana"), dec!(-1));

        let (_, entry) = net
            .entries()
            .find(|(k, _)| *k == "plastic-a")
            .unwrap();
        assert!(entry.required);
    }

    #[test]
    fn test_reversal_tolerates_missing_items() {
        let plan = StockPlan::for_lines(
            TransactionKind::Sale,
            &[line("Plastic-A", dec!(30))],
            None,
            &StockPolicy::default(),
        )
        .reversed();
        assert!(plan.entries().all(|(_, e)| !e.required));
        assert_eq!(plan.delta_for("Plastic-A"), dec!(1));
    }
}
