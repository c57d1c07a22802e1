//! Applies stock plans inside a unit of work.

use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::ItemId;
use tracing::{debug, warn};

use super::plan::StockPlan;
use super::policy::StockPolicy;
use crate::billing::BillingError;
use crate::records::{LineItem, TransactionKind};
use crate::store::UnitOfWork;

/// One applied stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockChange {
    /// Item moved.
    pub item_id: ItemId,
    /// Item display name.
    pub item_name: String,
    /// Signed bag delta.
    pub delta: Decimal,
    /// Stock after the movement.
    pub stock_after: Decimal,
}

/// Stock operations bound to one unit of work.
pub struct StockTracker<'w, W: UnitOfWork> {
    work: &'w mut W,
    policy: StockPolicy,
}

impl<'w, W: UnitOfWork> StockTracker<'w, W> {
    /// Binds the tracker to a unit of work.
    pub fn new(work: &'w mut W, policy: StockPolicy) -> Self {
        Self { work, policy }
    }

    /// Applies the lines of a new record.
    ///
    /// # Errors
    ///
    /// Returns `UnknownItem` if a line names an item that does not exist.
    pub async fn apply_create(
        &mut self,
        kind: TransactionKind,
        lines: &[LineItem],
    ) -> Result<Vec<StockChange>, BillingError> {
        let plan = self.plan(kind, lines).await?;
        self.apply(&plan).await
    }

    /// Reverses the stored lines and applies the new ones as one net plan.
    ///
    /// # Errors
    ///
    /// Returns `UnknownItem` if a new line names an item that does not exist.
    pub async fn apply_update(
        &mut self,
        kind: TransactionKind,
        old_lines: &[LineItem],
        new_lines: &[LineItem],
    ) -> Result<Vec<StockChange>, BillingError> {
        let old = self.plan(kind, old_lines).await?;
        let new = self.plan(kind, new_lines).await?;
        self.apply(&old.reversed().combine(new)).await
    }

    /// Reverses the lines of a deleted record.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn apply_delete(
        &mut self,
        kind: TransactionKind,
        lines: &[LineItem],
    ) -> Result<Vec<StockChange>, BillingError> {
        let plan = self.plan(kind, lines).await?.reversed();
        self.apply(&plan).await
    }

    async fn plan(
        &mut self,
        kind: TransactionKind,
        lines: &[LineItem],
    ) -> Result<StockPlan, BillingError> {
        if !kind.has_lines() || lines.is_empty() {
            return Ok(StockPlan::default());
        }
        let universal = self.work.universal_item().await?;
        Ok(StockPlan::for_lines(
            kind,
            lines,
            universal.as_ref().map(|item| item.name.as_str()),
            &self.policy,
        ))
    }

    /// Resolves every entry before moving anything, then adjusts each
    /// non-zero delta.
    async fn apply(&mut self, plan: &StockPlan) -> Result<Vec<StockChange>, BillingError> {
        let mut resolved = Vec::new();
        for (key, entry) in plan.entries() {
            match self.work.find_item_by_name(key).await? {
                Some(item) => resolved.push((item, entry.delta)),
                None if entry.required => {
                    return Err(BillingError::UnknownItem(entry.item_name.clone()));
                }
                None => {
                    warn!(
                        item = %entry.item_name,
                        delta = %entry.delta,
                        "Skipping stock reversal for an item that no longer exists"
                    );
                }
            }
        }

        let mut changes = Vec::with_capacity(resolved.len());
        for (item, delta) in resolved {
            if delta.is_zero() {
                continue;
            }
            let stock_after = self.work.adjust_item_stock(item.id, delta).await?;
            debug!(item = %item.name, %delta, %stock_after, "Stock adjusted");
            changes.push(StockChange {
                item_id: item.id,
                item_name: item.name,
                delta,
                stock_after,
            });
        }
        Ok(changes)
    }
}
