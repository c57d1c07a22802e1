//! Party ledger operations.
//!
//! The ledger keeps every party balance equal to the sum of the effects of
//! the live records charged to it. It never recomputes from history: each
//! create, update, and delete applies an incremental delta, and all three
//! run inside the unit of work of the owning record mutation so that each
//! effect is applied exactly once.

use rust_decimal::Decimal;
use tally_shared::types::PartyId;
use tracing::{debug, warn};

use super::party::{Party, PartyKey};
use crate::billing::BillingError;
use crate::records::TransactionRecord;
use crate::store::{StoreError, UnitOfWork};

/// Signed balance delta of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEffect(Decimal);

impl LedgerEffect {
    /// Effect of a persisted record.
    #[must_use]
    pub fn of(record: &TransactionRecord) -> Self {
        Self(record.ledger_effect())
    }

    /// Wraps a raw signed amount.
    #[must_use]
    pub const fn from_amount(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Signed amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

/// Party and balance after a ledger operation.
#[derive(Debug, Clone)]
pub struct LedgerPosting {
    /// Party the effect was applied to, with its new balance.
    pub party: Party,
    /// Balance after the operation.
    pub balance_after: Decimal,
}

/// Balance before a record, given the balance after it and its effect.
#[must_use]
pub fn balance_before(after: Decimal, effect: LedgerEffect) -> Decimal {
    after - effect.amount()
}

/// Ledger operations bound to one unit of work.
pub struct PartyLedger<'w, W: UnitOfWork> {
    work: &'w mut W,
}

impl<'w, W: UnitOfWork> PartyLedger<'w, W> {
    /// Binds the ledger to a unit of work.
    pub fn new(work: &'w mut W) -> Self {
        Self { work }
    }

    /// Resolves a party by natural key, creating it when absent.
    ///
    /// Precedence: an exact name and phone match is reused. A party with the
    /// same name but another phone is not reused; a new party is created and
    /// the near miss is logged.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for an incomplete key, or a store error.
    pub async fn find_or_create(&mut self, key: &PartyKey) -> Result<Party, BillingError> {
        if key.name().is_empty() {
            return Err(BillingError::MissingField("party name"));
        }
        if key.phone().is_empty() {
            return Err(BillingError::MissingField("party phone"));
        }

        let candidates = self.work.find_parties_by_name(&key.name_key()).await?;
        if let Some(existing) = candidates.iter().find(|p| p.key() == *key) {
            return Ok(existing.clone());
        }

        if let Some(near) = candidates.first() {
            warn!(
                name = %key.name(),
                phone = %key.phone(),
                existing_phone = %near.phone,
                "Party name matches with a different phone, creating a new party"
            );
        }

        let party = Party::new(key);
        self.work.insert_party(&party).await?;
        debug!(party_id = %party.id, name = %party.name, "Party created");
        Ok(party)
    }

    /// Applies the effect of a new record: find or create, then add.
    ///
    /// # Errors
    ///
    /// Returns a store error if the party cannot be resolved or adjusted.
    pub async fn apply_create(
        &mut self,
        key: &PartyKey,
        effect: LedgerEffect,
    ) -> Result<LedgerPosting, BillingError> {
        let party = self.find_or_create(key).await?;
        self.post(party, effect.amount()).await
    }

    /// Applies an edit as reverse then reapply.
    ///
    /// When the stored party still matches `new_key` the net delta lands on
    /// it in one step. Otherwise the old effect is removed from the old party
    /// and the new effect applied to the party resolved from `new_key`.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound` if the old party is gone, or a store error.
    pub async fn apply_update(
        &mut self,
        old_party: PartyId,
        old_effect: LedgerEffect,
        new_key: &PartyKey,
        new_effect: LedgerEffect,
    ) -> Result<LedgerPosting, BillingError> {
        let previous = self
            .work
            .get_party(old_party)
            .await?
            .ok_or(BillingError::PartyNotFound(old_party))?;

        if previous.key() == *new_key {
            let delta = new_effect.amount() - old_effect.amount();
            return self.post(previous, delta).await;
        }

        self.apply_delete(previous.id, old_effect).await?;
        self.apply_create(new_key, new_effect).await
    }

    /// Removes the effect of a deleted record and returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound` if the party is gone, or a store error.
    pub async fn apply_delete(
        &mut self,
        party: PartyId,
        effect: LedgerEffect,
    ) -> Result<Decimal, BillingError> {
        self.work
            .adjust_party_balance(party, -effect.amount())
            .await
            .map_err(|err| match err {
                StoreError::MissingRow { .. } => BillingError::PartyNotFound(party),
                other => BillingError::Store(other),
            })
    }

    async fn post(&mut self, mut party: Party, delta: Decimal) -> Result<LedgerPosting, BillingError> {
        let balance_after = self.work.adjust_party_balance(party.id, delta).await?;
        party.balance = balance_after;
        Ok(LedgerPosting {
            party,
            balance_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, LedgerStore};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_apply_create_creates_party_once() {
        let store = InMemoryStore::new();
        let mut work = store.begin().await.unwrap();
        let key = PartyKey::new("Acme", "9000000001");

        let mut ledger = PartyLedger::new(&mut work);
        let first = ledger
            .apply_create(&key, LedgerEffect::from_amount(dec!(900)))
            .await
            .unwrap();
        let second = ledger
            .apply_create(
                &PartyKey::new(" acme ", "9000000001"),
                LedgerEffect::from_amount(dec!(-400)),
            )
            .await
            .unwrap();

        assert_eq!(first.party.id, second.party.id);
        assert_eq!(first.balance_after, dec!(900));
        assert_eq!(second.balance_after, dec!(500));
        assert_eq!(work.list_parties().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_name_only_match_creates_new_party() {
        let store = InMemoryStore::new();
        let mut work = store.begin().await.unwrap();
        let mut ledger = PartyLedger::new(&mut work);

        let a = ledger
            .find_or_create(&PartyKey::new("Acme", "9000000001"))
            .await
            .unwrap();
        let b = ledger
            .find_or_create(&PartyKey::new("ACME", "9000000002"))
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_apply_update_same_party_nets_delta() {
        let store = InMemoryStore::new();
        let mut work = store.begin().await.unwrap();
        let key = PartyKey::new("Acme", "9000000001");
        let mut ledger = PartyLedger::new(&mut work);

        let created = ledger
            .apply_create(&key, LedgerEffect::from_amount(dec!(900)))
            .await
            .unwrap();
        let updated = ledger
            .apply_update(
                created.party.id,
                LedgerEffect::from_amount(dec!(900)),
                &key,
                LedgerEffect::from_amount(dec!(1200)),
            )
            .await
            .unwrap();

        assert_eq!(updated.party.id, created.party.id);
        assert_eq!(updated.balance_after, dec!(1200));
    }

    #[tokio::test]
    async fn test_apply_update_moves_effect_between_parties() {
        let store = InMemoryStore::new();
        let mut work = store.begin().await.unwrap();
        let mut ledger = PartyLedger::new(&mut work);

        let acme = ledger
            .apply_create(
                &PartyKey::new("Acme", "9000000001"),
                LedgerEffect::from_amount(dec!(900)),
            )
            .await
            .unwrap();
        let moved = ledger
            .apply_update(
                acme.party.id,
                LedgerEffect::from_amount(dec!(900)),
                &PartyKey::new("Bharat Stores", "9000000002"),
                LedgerEffect::from_amount(dec!(900)),
            )
            .await
            .unwrap();

        assert_ne!(moved.party.id, acme.party.id);
        assert_eq!(moved.balance_after, dec!(900));
        let old = work.get_party(acme.party.id).await.unwrap().unwrap();
        assert_eq!(old.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_apply_delete_missing_party() {
        let store = InMemoryStore::new();
        let mut work = store.begin().await.unwrap();
        let mut ledger = PartyLedger::new(&mut work);
        let missing = PartyId::new();

        let result = ledger
            .apply_delete(missing, LedgerEffect::from_amount(dec!(10)))
            .await;
        assert!(matches!(result, Err(BillingError::PartyNotFound(id)) if id == missing));
    }

    #[test]
    fn test_balance_before() {
        assert_eq!(
            balance_before(dec!(500), LedgerEffect::from_amount(dec!(-400))),
            dec!(900)
        );
        assert_eq!(
            balance_before(dec!(900), LedgerEffect::from_amount(dec!(900))),
            dec!(0)
        );
    }
}
