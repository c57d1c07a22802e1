//! In-memory store.
//!
//! A unit of work holds the store lock for its whole lifetime and writes to
//! a staged copy of the state. Commit swaps the copy in; dropping the unit
//! discards it. Constraints mirror the database schema: reference numbers
//! are unique per kind, party keys and item names are unique ignoring case.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tally_shared::types::{ItemId, PageRequest, PartyId, TransactionId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LedgerStore, StoreError, StoreResult, UnitOfWork, sort_records_newest_first};
use crate::ledger::{Party, normalize_name};
use crate::records::{RecordFilter, TransactionKind, TransactionRecord};
use crate::stock::Item;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    parties: HashMap<PartyId, Party>,
    items: HashMap<ItemId, Item>,
    records: HashMap<TransactionId, TransactionRecord>,
}

impl MemoryState {
    fn party_key_taken(&self, party: &Party) -> bool {
        self.parties
            .values()
            .any(|p| p.id != party.id && p.key() == party.key())
    }

    fn item_name_taken(&self, item: &Item) -> bool {
        let key = item.name_key();
        self.items
            .values()
            .any(|i| i.id != item.id && i.name_key() == key)
    }

    fn reference_taken(&self, record: &TransactionRecord) -> bool {
        self.records.values().any(|r| {
            r.id != record.id && r.kind == record.kind && r.reference_no == record.reference_no
        })
    }
}

/// Store backed by process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryStore {
    type Work = MemoryWork;

    async fn begin(&self) -> StoreResult<MemoryWork> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryWork { guard, staged })
    }
}

/// Unit of work over [`InMemoryStore`].
#[derive(Debug)]
pub struct MemoryWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl UnitOfWork for MemoryWork {
    async fn find_parties_by_name(&mut self, name_key: &str) -> StoreResult<Vec<Party>> {
        let mut found: Vec<Party> = self
            .staged
            .parties
            .values()
            .filter(|p| p.key().name_key() == name_key)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.created_at);
        Ok(found)
    }

    async fn get_party(&mut self, id: PartyId) -> StoreResult<Option<Party>> {
        Ok(self.staged.parties.get(&id).cloned())
    }

    async fn list_parties(&mut self) -> StoreResult<Vec<Party>> {
        Ok(self.staged.parties.values().cloned().collect())
    }

    async fn insert_party(&mut self, party: &Party) -> StoreResult<()> {
        if self.staged.party_key_taken(party) {
            return Err(StoreError::UniqueViolation(format!(
                "party {} ({})",
                party.name, party.phone
            )));
        }
        self.staged.parties.insert(party.id, party.clone());
        Ok(())
    }

    async fn update_party_details(&mut self, party: &Party) -> StoreResult<()> {
        if self.staged.party_key_taken(party) {
            return Err(StoreError::UniqueViolation(format!(
                "party {} ({})",
                party.name, party.phone
            )));
        }
        let stored = self
            .staged
            .parties
            .get_mut(&party.id)
            .ok_or_else(|| StoreError::missing("party", party.id))?;
        stored.name.clone_from(&party.name);
        stored.phone.clone_from(&party.phone);
        stored.address.clone_from(&party.address);
        stored.email.clone_from(&party.email);
        stored.updated_at = party.updated_at;
        Ok(())
    }

    async fn adjust_party_balance(&mut self, id: PartyId, delta: Decimal) -> StoreResult<Decimal> {
        let party = self
            .staged
            .parties
            .get_mut(&id)
            .ok_or_else(|| StoreError::missing("party", id))?;
        party.balance = party
            .balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::backend("party balance overflow"))?;
        party.updated_at = Utc::now();
        Ok(party.balance)
    }

    async fn delete_party(&mut self, id: PartyId) -> StoreResult<bool> {
        Ok(self.staged.parties.remove(&id).is_some())
    }

    async fn count_item_lines(&mut self, name_key: &str) -> StoreResult<u64> {
        let count = self
            .staged
            .records
            .values()
            .flat_map(|r| &r.lines)
            .filter(|line| normalize_name(&line.item_name) == name_key)
            .count();
        Ok(count as u64)
    }

    async fn count_party_records(&mut self, id: PartyId) -> StoreResult<u64> {
        let count = self
            .staged
            .records
            .values()
            .filter(|r| r.party_id == id)
            .count();
        Ok(count as u64)
    }

    async fn find_item_by_name(&mut self, name_key: &str) -> StoreResult<Option<Item>> {
        Ok(self
            .staged
            .items
            .values()
            .find(|i| i.name_key() == name_key)
            .cloned())
    }

    async fn get_item(&mut self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.staged.items.get(&id).cloned())
    }

    async fn universal_item(&mut self) -> StoreResult<Option<Item>> {
        Ok(self
            .staged
            .items
            .values()
            .find(|i| i.is_universal)
            .cloned())
    }

    async fn list_items(&mut self) -> StoreResult<Vec<Item>> {
        Ok(self.staged.items.values().cloned().collect())
    }

    async fn insert_item(&mut self, item: &Item) -> StoreResult<()> {
        if self.staged.item_name_taken(item) {
            return Err(StoreError::UniqueViolation(format!("item {}", item.name)));
        }
        if item.is_universal && self.staged.items.values().any(|i| i.is_universal) {
            return Err(StoreError::UniqueViolation("universal item".to_string()));
        }
        self.staged.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> StoreResult<()> {
        if self.staged.item_name_taken(item) {
            return Err(StoreError::UniqueViolation(format!("item {}", item.name)));
        }
        let stored = self
            .staged
            .items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::missing("item", item.id))?;
        *stored = item.clone();
        Ok(())
    }

    async fn adjust_item_stock(&mut self, id: ItemId, delta: Decimal) -> StoreResult<Decimal> {
        let item = self
            .staged
            .items
            .get_mut(&id)
            .ok_or_else(|| StoreError::missing("item", id))?;
        item.stock = item
            .stock
            .checked_add(delta)
            .ok_or_else(|| StoreError::backend("item stock overflow"))?;
        item.updated_at = Utc::now();
        Ok(item.stock)
    }

    async fn delete_item(&mut self, id: ItemId) -> StoreResult<bool> {
        Ok(self.staged.items.remove(&id).is_some())
    }

    async fn reference_exists(
        &mut self,
        kind: TransactionKind,
        reference_no: &str,
        excluding: Option<TransactionId>,
    ) -> StoreResult<bool> {
        Ok(self.staged.records.values().any(|r| {
            r.kind == kind && r.reference_no == reference_no && Some(r.id) != excluding
        }))
    }

    async fn list_references(&mut self, kind: TransactionKind) -> StoreResult<Vec<String>> {
        Ok(self
            .staged
            .records
            .values()
            .filter(|r| r.kind == kind)
            .map(|r| r.reference_no.clone())
            .collect())
    }

    async fn get_record(&mut self, id: TransactionId) -> StoreResult<Option<TransactionRecord>> {
        Ok(self.staged.records.get(&id).cloned())
    }

    async fn list_records(
        &mut self,
        filter: &RecordFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<TransactionRecord>, u64)> {
        let mut matching: Vec<&TransactionRecord> = self
            .staged
            .records
            .values()
            .filter(|r| filter.matches(r))
            .collect();
        let total = matching.len() as u64;
        sort_records_newest_first(&mut matching);

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let records = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((records, total))
    }

    async fn insert_record(&mut self, record: &TransactionRecord) -> StoreResult<()> {
        if self.staged.reference_taken(record) {
            return Err(StoreError::UniqueViolation(format!(
                "{} {}",
                record.kind, record.reference_no
            )));
        }
        if !self.staged.parties.contains_key(&record.party_id) {
            return Err(StoreError::missing("party", record.party_id));
        }
        self.staged.records.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_record(&mut self, record: &TransactionRecord) -> StoreResult<()> {
        if self.staged.reference_taken(record) {
            return Err(StoreError::UniqueViolation(format!(
                "{} {}",
                record.kind, record.reference_no
            )));
        }
        let stored = self
            .staged
            .records
            .get_mut(&record.id)
            .ok_or_else(|| StoreError::missing("transaction", record.id))?;
        *stored = record.clone();
        Ok(())
    }

    async fn delete_record(&mut self, id: TransactionId) -> StoreResult<bool> {
        Ok(self.staged.records.remove(&id).is_some())
    }

    async fn commit(mut self) -> StoreResult<()> {
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}
