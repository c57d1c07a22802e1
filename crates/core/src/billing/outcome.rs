//! Results of billing operations.

use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{PartyId, TransactionId};

use crate::document::DeliveryStatus;
use crate::records::{TransactionKind, TransactionRecord};
use crate::stock::StockChange;

/// A committed create or update.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionOutcome {
    /// The record as persisted.
    pub record: TransactionRecord,
    /// Party balance after the operation.
    pub balance_after: Decimal,
    /// Stock movements applied.
    pub stock_changes: Vec<StockChange>,
    /// What happened to the document.
    pub delivery: DeliveryStatus,
}

/// A committed delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    /// Deleted record ID.
    pub id: TransactionId,
    /// Kind of the deleted record.
    pub kind: TransactionKind,
    /// Its number, now free for reuse.
    pub reference_no: String,
    /// Party the effect was reversed on.
    pub party_id: PartyId,
    /// Party balance after the reversal.
    pub balance_after: Decimal,
    /// Stock movements applied.
    pub stock_changes: Vec<StockChange>,
}

/// One failed delete in a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkDeleteFailure {
    /// Record that was not deleted.
    pub id: TransactionId,
    /// Why.
    pub reason: String,
}

/// Outcome of a bulk delete. Each delete commits on its own.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkDeleteReport {
    /// Records deleted.
    pub deleted: Vec<TransactionId>,
    /// Records left in place.
    pub failed: Vec<BulkDeleteFailure>,
}

impl BulkDeleteReport {
    /// Number of records deleted.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Returns true if every delete succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
