//! Property-based tests for the party ledger.
//!
//! - Balance conservation: after any sequence of creates, updates, and
//!   deletes, each balance equals the sum of its live effects.
//! - Update round trip: editing an effect and editing it back leaves the
//!   balance unchanged.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::PartyId;

use super::party::PartyKey;
use super::service::{LedgerEffect, PartyLedger};
use crate::store::{InMemoryStore, LedgerStore, UnitOfWork};

const PARTIES: [(&str, &str); 3] = [
    ("Acme", "9000000001"),
    ("Bharat Stores", "9000000002"),
    ("Acme", "9000000003"),
];

#[derive(Debug, Clone)]
enum Op {
    Create { party: usize, effect: Decimal },
    Update { slot: usize, party: usize, effect: Decimal },
    Delete { slot: usize },
}

/// Signed amounts from -10,000.00 to 10,000.00.
fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PARTIES.len(), signed_amount()).prop_map(|(party, effect)| Op::Create { party, effect }),
        (0usize..16, 0..PARTIES.len(), signed_amount())
            .prop_map(|(slot, party, effect)| Op::Update { slot, party, effect }),
        (0usize..16).prop_map(|slot| Op::Delete { slot }),
    ]
}

fn key(index: usize) -> PartyKey {
    let (name, phone) = PARTIES[index];
    PartyKey::new(name, phone)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_balance_equals_sum_of_live_effects(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let rt = runtime();
        rt.block_on(async {
            let store = InMemoryStore::new();
            let mut work = store.begin().await.unwrap();
            // Live records: (party, effect).
            let mut live: Vec<(PartyId, Decimal)> = Vec::new();

            for op in ops {
                let mut ledger = PartyLedger::new(&mut work);
                match op {
                    Op::Create { party, effect } => {
                        let posting = ledger
                            .apply_create(&key(party), LedgerEffect::from_amount(effect))
                            .await
                            .unwrap();
                        live.push((posting.party.id, effect));
                    }
                    Op::Update { slot, party, effect } => {
                        if live.is_empty() {
                            continue;
                        }
                        let slot = slot % live.len();
                        let (old_party, old_effect) = live[slot];
                        let posting = ledger
                            .apply_update(
                                old_party,
                                LedgerEffect::from_amount(old_effect),
                                &key(party),
                                LedgerEffect::from_amount(effect),
                            )
                            .await
                            .unwrap();
                        live[slot] = (posting.party.id, effect);
                    }
                    Op::Delete { slot } => {
                        if live.is_empty() {
                            continue;
                        }
                        let (party, effect) = live.remove(slot % live.len());
                        ledger
                            .apply_delete(party, LedgerEffect::from_amount(effect))
                            .await
                            .unwrap();
                    }
                }
            }

            for party in work.list_parties().await.unwrap() {
                let expected: Decimal = live
                    .iter()
                    .filter(|(id, _)| *id == party.id)
                    .map(|(_, effect)| *effect)
                    .sum();
                assert_eq!(party.balance, expected, "party {}", party.name);
            }
        });
    }

    #[test]
    fn prop_update_round_trip_restores_balance(
        original in signed_amount(),
        edited in signed_amount(),
        other in 0..PARTIES.len(),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store = InMemoryStore::new();
            let mut work = store.begin().await.unwrap();
            let mut ledger = PartyLedger::new(&mut work);

            let created = ledger
                .apply_create(&key(0), LedgerEffect::from_amount(original))
                .await
                .unwrap();
            let moved = ledger
                .apply_update(
                    created.party.id,
                    LedgerEffect::from_amount(original),
                    &key(other),
                    LedgerEffect::from_amount(edited),
                )
                .await
                .unwrap();
            let back = ledger
                .apply_update(
                    moved.party.id,
                    LedgerEffect::from_amount(edited),
                    &key(0),
                    LedgerEffect::from_amount(original),
                )
                .await
                .unwrap();

            assert_eq!(back.party.id, created.party.id);
            assert_eq!(back.balance_after, original);
            for party in work.list_parties().await.unwrap() {
                if party.id != created.party.id {
                    assert_eq!(party.balance, Decimal::ZERO);
                }
            }
        });
    }
}
