//! Property-based tests for the stock tracker.
//!
//! - Stock conservation: each item's stock equals its opening stock plus the
//!   per-line rounded bag movements of the live records.
//! - Universal consumption: the packaging item moves by the bags of every
//!   other item.
//! - Edit round trip: editing lines and editing them back restores stock.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::item::{Item, ItemCategory, NewItem};
use super::policy::StockPolicy;
use super::tracker::StockTracker;
use crate::records::{LineItem, TransactionKind};
use crate::store::{InMemoryStore, LedgerStore, UnitOfWork};

const GOODS: [&str; 3] = ["Plastic-A", "Plastic-B", "Kirana-C"];
const UNIVERSAL: &str = "Bardana";
const OPENING: i64 = 1_000;

fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![Just(TransactionKind::Sale), Just(TransactionKind::Purchase)]
}

/// Quantities from 0.1 kg to 500.0 kg.
fn line_strategy() -> impl Strategy<Value = LineItem> {
    (0..GOODS.len(), 1i64..5_000i64).prop_map(|(item, tenths)| {
        let quantity_kg = Decimal::new(tenths, 1);
        LineItem {
            item_name: GOODS[item].to_string(),
            quantity_kg,
            rate: Decimal::ONE,
            total: quantity_kg,
        }
    })
}

fn lines_strategy() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec(line_strategy(), 1..5)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    let mut work = store.begin().await.unwrap();
    for (name, universal) in GOODS
        .iter()
        .map(|n| (*n, false))
        .chain(std::iter::once((UNIVERSAL, true)))
    {
        let item = Item::new(&NewItem {
            name: name.to_string(),
            category: ItemCategory::Primary,
            opening_stock: Decimal::from(OPENING),
            low_stock_alert: Decimal::ZERO,
            is_universal: universal,
        });
        work.insert_item(&item).await.unwrap();
    }
    work.commit().await.unwrap();
    store
}

fn sign(kind: TransactionKind) -> Decimal {
    if kind == TransactionKind::Sale {
        Decimal::NEGATIVE_ONE
    } else {
        Decimal::ONE
    }
}

fn expected_stock(
    live: &[(TransactionKind, Vec<LineItem>)],
    policy: &StockPolicy,
) -> Vec<(String, Decimal)> {
    let mut expected: Vec<(String, Decimal)> = GOODS
        .iter()
        .chain(std::iter::once(&UNIVERSAL))
        .map(|n| ((*n).to_string(), Decimal::from(OPENING)))
        .collect();
    for (kind, lines) in live {
        for line in lines {
            let bags = sign(*kind) * policy.bags_for(line.quantity_kg);
            for (name, stock) in &mut expected {
                if *name == line.item_name || *name == UNIVERSAL {
                    *stock += bags;
                }
            }
        }
    }
    expected
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_stock_conserved(
        records in prop::collection::vec((kind_strategy(), lines_strategy()), 1..8),
        edits in prop::collection::vec((0usize..8, lines_strategy()), 0..4),
        deletes in prop::collection::vec(0usize..8, 0..3),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store = seeded_store().await;
            let policy = StockPolicy::default();
            let mut work = store.begin().await.unwrap();
            let mut live: Vec<(TransactionKind, Vec<LineItem>)> = Vec::new();

            for (kind, lines) in records {
                StockTracker::new(&mut work, policy)
                    .apply_create(kind, &lines)
                    .await
                    .unwrap();
                live.push((kind, lines));
            }
            for (slot, lines) in edits {
                let slot = slot % live.len();
                let kind = live[slot].0;
                StockTracker::new(&mut work, policy)
                    .apply_update(kind, &live[slot].1, &lines)
                    .await
                    .unwrap();
                live[slot].1 = lines;
            }
            for slot in deletes {
                if live.is_empty() {
                    break;
                }
                let (kind, lines) = live.remove(slot % live.len());
                StockTracker::new(&mut work, policy)
                    .apply_delete(kind, &lines)
                    .await
                    .unwrap();
            }

            for (name, stock) in expected_stock(&live, &policy) {
                let item = work
                    .find_item_by_name(&name.to_lowercase())
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(item.stock, stock, "item {name}");
            }
        });
    }

    #[test]
    fn prop_edit_round_trip_restores_stock(
        kind in kind_strategy(),
        original in lines_strategy(),
        edited in lines_strategy(),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store = seeded_store().await;
            let policy = StockPolicy::default();
            let mut work = store.begin().await.unwrap();

            StockTracker::new(&mut work, policy)
                .apply_create(kind, &original)
                .await
                .unwrap();
            let before = work.list_items().await.unwrap();

            {
                let mut tracker = StockTracker::new(&mut work, policy);
                tracker.apply_update(kind, &original, &edited).await.unwrap();
                tracker.apply_update(kind, &edited, &original).await.unwrap();
            }

            for item in before {
                let now = work.get_item(item.id).await.unwrap().unwrap();
                assert_eq!(now.stock, item.stock, "item {}", item.name);
            }
        });
    }
}
