//! Billing service.
//!
//! Create, update, and delete of sales, purchases, and payments. Each
//! mutation runs in one unit of work spanning the record, the party ledger,
//! and stock; document delivery happens after commit and cannot undo it.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{PageRequest, PageResponse, TransactionId};
use tracing::{error, info, instrument};

use super::error::BillingError;
use super::outcome::{BulkDeleteFailure, BulkDeleteReport, DeleteOutcome, TransactionOutcome};
use crate::document::DocumentDispatcher;
use crate::ledger::{LedgerEffect, PartyKey, PartyLedger};
use crate::numbering::{
    self, NumberScope, is_number_taken, next_payment_number, suggest_next,
};
use crate::records::{
    LineItem, Movement, PaymentDirection, PaymentInput, RecordFilter, TradeInput,
    TransactionKind, TransactionRecord, build_lines, validate_payment, validate_trade,
};
use crate::stock::{StockPolicy, StockTracker};
use crate::store::{LedgerStore, StoreError, UnitOfWork};

/// Validated content of a record about to be written.
struct Draft {
    kind: TransactionKind,
    /// `None` for payments, which are numbered by the system.
    reference_no: Option<String>,
    party: PartyKey,
    date: NaiveDate,
    direction: Option<PaymentDirection>,
    lines: Vec<LineItem>,
    total_amount: Decimal,
    notes: Option<String>,
}

impl Draft {
    fn trade(kind: TransactionKind, input: &TradeInput) -> Result<Self, BillingError> {
        validate_trade(input)?;
        let (lines, total_amount) = build_lines(&input.lines)?;
        Ok(Self {
            kind,
            reference_no: Some(input.reference_no.trim().to_string()),
            party: input.party.key(),
            date: input.date,
            direction: None,
            lines,
            total_amount,
            notes: clean_notes(input.notes.as_deref()),
        })
    }

    fn payment(input: &PaymentInput) -> Result<Self, BillingError> {
        validate_payment(input)?;
        Ok(Self {
            kind: TransactionKind::Payment,
            reference_no: None,
            party: input.party.key(),
            date: input.date,
            direction: Some(input.direction),
            lines: Vec::new(),
            total_amount: input.amount,
            notes: clean_notes(input.notes.as_deref()),
        })
    }

    fn effect(&self) -> LedgerEffect {
        LedgerEffect::from_amount(Movement::of(self.kind, self.direction).effect(self.total_amount))
    }
}

/// Billing service over a [`LedgerStore`].
pub struct BillingService<S: LedgerStore> {
    store: Arc<S>,
    dispatcher: DocumentDispatcher,
    policy: StockPolicy,
}

impl<S: LedgerStore> Clone for BillingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: self.dispatcher.clone(),
            policy: self.policy,
        }
    }
}

impl<S: LedgerStore> BillingService<S> {
    /// Create a new billing service.
    #[must_use]
    pub fn new(store: Arc<S>, dispatcher: DocumentDispatcher, policy: StockPolicy) -> Self {
        Self {
            store,
            dispatcher,
            policy,
        }
    }

    /// The document dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &DocumentDispatcher {
        &self.dispatcher
    }

    // ========== Sales and purchases ==========

    /// Records a sale.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `DuplicateReference`, `UnknownItem`, or a
    /// store error. Nothing is persisted on error.
    pub async fn create_sale(&self, input: TradeInput) -> Result<TransactionOutcome, BillingError> {
        self.create(Draft::trade(TransactionKind::Sale, &input)?).await
    }

    /// Records a purchase.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_sale`].
    pub async fn create_purchase(
        &self,
        input: TradeInput,
    ) -> Result<TransactionOutcome, BillingError> {
        self.create(Draft::trade(TransactionKind::Purchase, &input)?)
            .await
    }

    /// Replaces a sale.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` plus everything [`Self::create_sale`] can.
    pub async fn update_sale(
        &self,
        id: TransactionId,
        input: TradeInput,
    ) -> Result<TransactionOutcome, BillingError> {
        self.update(id, Draft::trade(TransactionKind::Sale, &input)?)
            .await
    }

    /// Replaces a purchase.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_sale`].
    pub async fn update_purchase(
        &self,
        id: TransactionId,
        input: TradeInput,
    ) -> Result<TransactionOutcome, BillingError> {
        self.update(id, Draft::trade(TransactionKind::Purchase, &input)?)
            .await
    }

    // ========== Payments ==========

    /// Records a payment under the next `PAY-` number.
    ///
    /// # Errors
    ///
    /// Returns a validation error or a store error.
    pub async fn create_payment(
        &self,
        input: PaymentInput,
    ) -> Result<TransactionOutcome, BillingError> {
        self.create(Draft::payment(&input)?).await
    }

    /// Replaces a payment, keeping its number.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, a validation error, or a store error.
    pub async fn update_payment(
        &self,
        id: TransactionId,
        input: PaymentInput,
    ) -> Result<TransactionOutcome, BillingError> {
        self.update(id, Draft::payment(&input)?).await
    }

    // ========== Deletes ==========

    /// Deletes a record, reversing its ledger and stock effects.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or a store error.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        kind: TransactionKind,
        id: TransactionId,
    ) -> Result<DeleteOutcome, BillingError> {
        let mut work = self.store.begin().await?;
        let stored = load(&mut work, kind, id).await?;

        let balance_after = PartyLedger::new(&mut work)
            .apply_delete(stored.party_id, LedgerEffect::of(&stored))
            .await?;
        let stock_changes = StockTracker::new(&mut work, self.policy)
            .apply_delete(kind, &stored.lines)
            .await?;
        if !work.delete_record(id).await? {
            return Err(BillingError::TransactionNotFound { kind, id });
        }
        commit(work).await?;

        info!(
            reference_no = %stored.reference_no,
            party_id = %stored.party_id,
            %balance_after,
            "Transaction deleted"
        );
        Ok(DeleteOutcome {
            id,
            kind,
            reference_no: stored.reference_no,
            party_id: stored.party_id,
            balance_after,
            stock_changes,
        })
    }

    /// Deletes records one by one. A failure does not stop the rest.
    pub async fn bulk_delete(&self, kind: TransactionKind, ids: &[TransactionId]) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();
        for &id in ids {
            match self.delete(kind, id).await {
                Ok(_) => report.deleted.push(id),
                Err(err) => report.failed.push(BulkDeleteFailure {
                    id,
                    reason: err.to_string(),
                }),
            }
        }
        info!(
            %kind,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Bulk delete finished"
        );
        report
    }

    // ========== Reads ==========

    /// Gets a record of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or a store error.
    pub async fn get(
        &self,
        kind: TransactionKind,
        id: TransactionId,
    ) -> Result<TransactionRecord, BillingError> {
        let mut work = self.store.begin().await?;
        load(&mut work, kind, id).await
    }

    /// Lists records of `kind`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list(
        &self,
        kind: TransactionKind,
        filter: RecordFilter,
        page: PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, BillingError> {
        let filter = RecordFilter {
            kind: Some(kind),
            ..filter
        };
        let mut work = self.store.begin().await?;
        let (records, total) = work.list_records(&filter, page).await?;
        Ok(PageResponse::new(records, page.page, page.per_page, total))
    }

    /// Suggests the next number for `scope`.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn suggest_next_number(&self, scope: NumberScope) -> Result<String, BillingError> {
        let mut work = self.store.begin().await?;
        let existing = work.list_references(scope.kind()).await?;
        Ok(match scope {
            NumberScope::Payment => next_payment_number(&existing),
            NumberScope::Sale | NumberScope::Purchase => suggest_next(&existing),
        })
    }

    /// Returns true if `number` is well formed and free in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` for a malformed number or a store error.
    pub async fn is_number_available(
        &self,
        scope: NumberScope,
        number: &str,
        excluding: Option<TransactionId>,
    ) -> Result<bool, BillingError> {
        numbering::validate_format(number)?;
        let mut work = self.store.begin().await?;
        Ok(!is_number_taken(&mut work, scope, number, excluding).await?)
    }

    // ========== Internals ==========

    #[instrument(skip(self, draft), fields(kind = %draft.kind))]
    async fn create(&self, draft: Draft) -> Result<TransactionOutcome, BillingError> {
        let mut work = self.store.begin().await?;

        let reference_no = match &draft.reference_no {
            Some(number) => {
                ensure_number_free(&mut work, draft.kind, number, None).await?;
                number.clone()
            }
            None => next_payment_number(&work.list_references(draft.kind).await?),
        };

        let posting = PartyLedger::new(&mut work)
            .apply_create(&draft.party, draft.effect())
            .await?;

        let now = Utc::now();
        let record = TransactionRecord {
            id: TransactionId::new(),
            kind: draft.kind,
            reference_no,
            party_id: posting.party.id,
            party_name: posting.party.name.clone(),
            party_phone: posting.party.phone.clone(),
            date: draft.date,
            direction: draft.direction,
            lines: draft.lines,
            total_amount: draft.total_amount,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };
        work.insert_record(&record)
            .await
            .map_err(|err| reference_conflict(err, &record))?;

        let stock_changes = StockTracker::new(&mut work, self.policy)
            .apply_create(record.kind, &record.lines)
            .await?;
        commit(work).await?;

        info!(
            reference_no = %record.reference_no,
            party_id = %record.party_id,
            total = %record.total_amount,
            balance_after = %posting.balance_after,
            "Transaction created"
        );

        let delivery = self.dispatcher.dispatch(&record, posting.balance_after).await;
        Ok(TransactionOutcome {
            record,
            balance_after: posting.balance_after,
            stock_changes,
            delivery,
        })
    }

    #[instrument(skip(self, draft), fields(kind = %draft.kind))]
    async fn update(
        &self,
        id: TransactionId,
        draft: Draft,
    ) -> Result<TransactionOutcome, BillingError> {
        let mut work = self.store.begin().await?;
        let stored = load(&mut work, draft.kind, id).await?;

        let reference_no = match &draft.reference_no {
            Some(number) => {
                ensure_number_free(&mut work, draft.kind, number, Some(id)).await?;
                number.clone()
            }
            None => stored.reference_no.clone(),
        };

        let posting = PartyLedger::new(&mut work)
            .apply_update(
                stored.party_id,
                LedgerEffect::of(&stored),
                &draft.party,
                draft.effect(),
            )
            .await?;
        let stock_changes = StockTracker::new(&mut work, self.policy)
            .apply_update(draft.kind, &stored.lines, &draft.lines)
            .await?;

        let record = TransactionRecord {
            id,
            kind: draft.kind,
            reference_no,
            party_id: posting.party.id,
            party_name: posting.party.name.clone(),
            party_phone: posting.party.phone.clone(),
            date: draft.date,
            direction: draft.direction,
            lines: draft.lines,
            total_amount: draft.total_amount,
            notes: draft.notes,
            created_at: stored.created_at,
            updated_at: Utc::now(),
        };
        work.update_record(&record)
            .await
            .map_err(|err| reference_conflict(err, &record))?;
        commit(work).await?;

        info!(
            reference_no = %record.reference_no,
            party_id = %record.party_id,
            total = %record.total_amount,
            balance_after = %posting.balance_after,
            "Transaction updated"
        );

        let delivery = self.dispatcher.dispatch(&record, posting.balance_after).await;
        Ok(TransactionOutcome {
            record,
            balance_after: posting.balance_after,
            stock_changes,
            delivery,
        })
    }
}

async fn load<W: UnitOfWork>(
    work: &mut W,
    kind: TransactionKind,
    id: TransactionId,
) -> Result<TransactionRecord, BillingError> {
    work.get_record(id)
        .await?
        .filter(|record| record.kind == kind)
        .ok_or(BillingError::TransactionNotFound { kind, id })
}

async fn ensure_number_free<W: UnitOfWork>(
    work: &mut W,
    kind: TransactionKind,
    number: &str,
    excluding: Option<TransactionId>,
) -> Result<(), BillingError> {
    if is_number_taken(work, NumberScope::from(kind), number, excluding).await? {
        return Err(BillingError::DuplicateReference {
            kind,
            reference_no: number.to_string(),
        });
    }
    Ok(())
}

/// A unique violation on write means another session took the number first.
fn reference_conflict(err: StoreError, record: &TransactionRecord) -> BillingError {
    match err {
        StoreError::UniqueViolation(_) => BillingError::DuplicateReference {
            kind: record.kind,
            reference_no: record.reference_no.clone(),
        },
        other => BillingError::Store(other),
    }
}

async fn commit<W: UnitOfWork>(work: W) -> Result<(), BillingError> {
    work.commit().await.map_err(|err| {
        error!(error = %err, "Commit failed, unit of work rolled back");
        BillingError::Store(err)
    })
}

fn clean_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
}
