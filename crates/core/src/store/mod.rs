//! Persistence seam: a store hands out units of work.
//!
//! Every mutating operation runs inside one [`UnitOfWork`]. Record
//! persistence, party balance adjustment, and stock adjustment either all
//! land on [`UnitOfWork::commit`] or none do: dropping an uncommitted unit
//! of work discards everything it wrote.
//!
//! The db crate implements these traits over a database transaction; the
//! [`memory`] module provides a copy-on-write implementation used by tests
//! and local tooling.

pub mod memory;

use std::future::Future;

use rust_decimal::Decimal;
use tally_shared::types::{ItemId, PageRequest, PartyId, TransactionId};
use thiserror::Error;

use crate::ledger::Party;
use crate::records::{RecordFilter, TransactionKind, TransactionRecord};
use crate::stock::Item;

pub use memory::InMemoryStore;

/// Errors raised by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row the operation depends on does not exist.
    #[error("{entity} not found: {id}")]
    MissingRow {
        /// Entity name.
        entity: &'static str,
        /// Row identifier.
        id: String,
    },

    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a missing row error.
    #[must_use]
    pub fn missing(entity: &'static str, id: impl ToString) -> Self {
        Self::MissingRow {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A store that can open units of work.
pub trait LedgerStore: Send + Sync + 'static {
    /// The unit of work type.
    type Work: UnitOfWork;

    /// Opens a new unit of work.
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Work>> + Send;
}

/// All reads and writes the billing core performs, scoped to one atomic unit.
pub trait UnitOfWork: Send {
    // ========== Parties ==========

    /// Parties whose lowercased name equals `name_key`.
    fn find_parties_by_name(
        &mut self,
        name_key: &str,
    ) -> impl Future<Output = StoreResult<Vec<Party>>> + Send;

    /// Party by ID.
    fn get_party(&mut self, id: PartyId) -> impl Future<Output = StoreResult<Option<Party>>> + Send;

    /// All parties.
    fn list_parties(&mut self) -> impl Future<Output = StoreResult<Vec<Party>>> + Send;

    /// Inserts a party.
    fn insert_party(&mut self, party: &Party) -> impl Future<Output = StoreResult<()>> + Send;

    /// Writes contact fields of a party. The balance column is not touched.
    fn update_party_details(
        &mut self,
        party: &Party,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Adds `delta` to the party balance and returns the new balance.
    fn adjust_party_balance(
        &mut self,
        id: PartyId,
        delta: Decimal,
    ) -> impl Future<Output = StoreResult<Decimal>> + Send;

    /// Deletes a party. Returns false if it did not exist.
    fn delete_party(&mut self, id: PartyId) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Number of record lines whose lowercased item name equals `name_key`.
    fn count_item_lines(
        &mut self,
        name_key: &str,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Number of records charged to the party.
    fn count_party_records(
        &mut self,
        id: PartyId,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    // ========== Items ==========

    /// Item whose lowercased name equals `name_key`.
    fn find_item_by_name(
        &mut self,
        name_key: &str,
    ) -> impl Future<Output = StoreResult<Option<Item>>> + Send;

    /// Item by ID.
    fn get_item(&mut self, id: ItemId) -> impl Future<Output = StoreResult<Option<Item>>> + Send;

    /// The universal item, if one exists.
    fn universal_item(&mut self) -> impl Future<Output = StoreResult<Option<Item>>> + Send;

    /// All items.
    fn list_items(&mut self) -> impl Future<Output = StoreResult<Vec<Item>>> + Send;

    /// Inserts an item.
    fn insert_item(&mut self, item: &Item) -> impl Future<Output = StoreResult<()>> + Send;

    /// Writes every column of an item.
    fn update_item(&mut self, item: &Item) -> impl Future<Output = StoreResult<()>> + Send;

    /// Adds `delta` bags to the item stock and returns the new stock.
    fn adjust_item_stock(
        &mut self,
        id: ItemId,
        delta: Decimal,
    ) -> impl Future<Output = StoreResult<Decimal>> + Send;

    /// Deletes an item. Returns false if it did not exist.
    fn delete_item(&mut self, id: ItemId) -> impl Future<Output = StoreResult<bool>> + Send;

    // ========== Records ==========

    /// Returns true if a live record of `kind` uses `reference_no`,
    /// ignoring the record `excluding`.
    fn reference_exists(
        &mut self,
        kind: TransactionKind,
        reference_no: &str,
        excluding: Option<TransactionId>,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// All reference numbers in use for `kind`.
    fn list_references(
        &mut self,
        kind: TransactionKind,
    ) -> impl Future<Output = StoreResult<Vec<String>>> + Send;

    /// Record by ID, with lines.
    fn get_record(
        &mut self,
        id: TransactionId,
    ) -> impl Future<Output = StoreResult<Option<TransactionRecord>>> + Send;

    /// One page of the records matching `filter`, newest date first, plus
    /// the total number of matches.
    fn list_records(
        &mut self,
        filter: &RecordFilter,
        page: PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<TransactionRecord>, u64)>> + Send;

    /// Inserts a record with its lines.
    fn insert_record(
        &mut self,
        record: &TransactionRecord,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Replaces a record and its lines.
    fn update_record(
        &mut self,
        record: &TransactionRecord,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a record and its lines. Returns false if it did not exist.
    fn delete_record(
        &mut self,
        id: TransactionId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    // ========== Boundary ==========

    /// Makes every write of this unit durable.
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Newest first: date, then creation time.
pub(crate) fn sort_records_newest_first(records: &mut [&TransactionRecord]) {
    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
