//! Record domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{PartyId, TransactionId};

use crate::ledger::PartyKey;

/// The three kinds of financial transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Sales invoice (`invoiceNo`).
    Sale,
    /// Purchase bill (`billNo`).
    Purchase,
    /// Cash payment (`paymentNo`, system generated).
    Payment,
}

impl TransactionKind {
    /// Stable lowercase name used in storage and URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Purchase => "purchase",
            Self::Payment => "payment",
        }
    }

    /// Human label of the reference number for this kind.
    #[must_use]
    pub const fn reference_label(self) -> &'static str {
        match self {
            Self::Sale => "invoice number",
            Self::Purchase => "bill number",
            Self::Payment => "payment number",
        }
    }

    /// Returns true for kinds that carry line items and move stock.
    #[must_use]
    pub const fn has_lines(self) -> bool {
        matches!(self, Self::Sale | Self::Purchase)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sale" | "sales" => Ok(Self::Sale),
            "purchase" | "purchases" => Ok(Self::Purchase),
            "payment" | "payments" => Ok(Self::Payment),
            _ => Err(format!("Unknown transaction kind: {s}")),
        }
    }
}

/// Direction of a cash payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentDirection {
    /// The party paid us.
    #[serde(rename = "payment-in")]
    PaymentIn,
    /// We paid the party.
    #[serde(rename = "payment-out")]
    PaymentOut,
}

impl PaymentDirection {
    /// Stable name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentIn => "payment-in",
            Self::PaymentOut => "payment-out",
        }
    }
}

impl FromStr for PaymentDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment-in" | "in" => Ok(Self::PaymentIn),
            "payment-out" | "out" => Ok(Self::PaymentOut),
            _ => Err(format!("Unknown payment direction: {s}")),
        }
    }
}

/// What a record does to the party balance.
///
/// Balance is the net amount the party owes the business:
///
/// | Movement    | Effect       |
/// |-------------|--------------|
/// | Sale        | `+ amount`   |
/// | Purchase    | `- amount`   |
/// | Payment in  | `- amount`   |
/// | Payment out | `+ amount`   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Goods sold on credit.
    Sale,
    /// Goods bought on credit.
    Purchase,
    /// Cash received from the party.
    PaymentIn,
    /// Cash paid to the party.
    PaymentOut,
}

impl Movement {
    /// Movement of a record kind; payments without a direction count as in.
    #[must_use]
    pub const fn of(kind: TransactionKind, direction: Option<PaymentDirection>) -> Self {
        match (kind, direction) {
            (TransactionKind::Sale, _) => Self::Sale,
            (TransactionKind::Purchase, _) => Self::Purchase,
            (TransactionKind::Payment, Some(PaymentDirection::PaymentOut)) => Self::PaymentOut,
            (TransactionKind::Payment, _) => Self::PaymentIn,
        }
    }

    /// Returns true when the movement increases what the party owes.
    #[must_use]
    pub const fn increases_balance(self) -> bool {
        matches!(self, Self::Sale | Self::PaymentOut)
    }

    /// Signed balance delta for `amount`.
    #[must_use]
    pub fn effect(self, amount: Decimal) -> Decimal {
        if self.increases_balance() {
            amount
        } else {
            -amount
        }
    }
}

/// A persisted line of a sale or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item display name as entered.
    pub item_name: String,
    /// Quantity in kilograms.
    pub quantity_kg: Decimal,
    /// Price per kilogram.
    pub rate: Decimal,
    /// `quantity_kg * rate`, rounded half away from zero to two decimals.
    pub total: Decimal,
}

/// A line as submitted by the caller; the total is always derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineInput {
    /// Item display name.
    pub item_name: String,
    /// Quantity in kilograms.
    pub quantity_kg: Decimal,
    /// Price per kilogram.
    pub rate: Decimal,
}

/// Party identity as submitted with a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyInput {
    /// Party name.
    pub name: String,
    /// Party phone.
    pub phone: String,
}

impl PartyInput {
    /// Natural key of the submitted party.
    #[must_use]
    pub fn key(&self) -> PartyKey {
        PartyKey::new(&self.name, &self.phone)
    }
}

/// Input for creating or updating a sale or purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeInput {
    /// Human-assigned invoice or bill number.
    pub reference_no: String,
    /// Party the goods are sold to or bought from.
    pub party: PartyInput,
    /// Transaction date.
    pub date: NaiveDate,
    /// Line items (at least one).
    pub lines: Vec<LineInput>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for creating or updating a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    /// Party that paid or was paid.
    pub party: PartyInput,
    /// Payment date.
    pub date: NaiveDate,
    /// Positive amount.
    pub amount: Decimal,
    /// In or out.
    pub direction: PaymentDirection,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A persisted sale, purchase, or payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Record ID.
    pub id: TransactionId,
    /// Sale, purchase, or payment.
    pub kind: TransactionKind,
    /// Invoice, bill, or payment number.
    pub reference_no: String,
    /// Party charged by this record.
    pub party_id: PartyId,
    /// Party name at write time.
    pub party_name: String,
    /// Party phone at write time.
    pub party_phone: String,
    /// Transaction date.
    pub date: NaiveDate,
    /// Payment direction (payments only).
    pub direction: Option<PaymentDirection>,
    /// Line items (sales and purchases only).
    pub lines: Vec<LineItem>,
    /// Sum of line totals, or the payment amount.
    pub total_amount: Decimal,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Last modified at.
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Balance movement this record represents.
    #[must_use]
    pub fn movement(&self) -> Movement {
        Movement::of(self.kind, self.direction)
    }

    /// Signed effect on the party balance.
    #[must_use]
    pub fn ledger_effect(&self) -> Decimal {
        self.movement().effect(self.total_amount)
    }

    /// Party key from the stored snapshot.
    #[must_use]
    pub fn party_key(&self) -> PartyKey {
        PartyKey::new(&self.party_name, &self.party_phone)
    }
}

/// Filter for listing records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Restrict to one kind.
    pub kind: Option<TransactionKind>,
    /// Restrict to one party.
    pub party_id: Option<PartyId>,
    /// Inclusive start date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive end date.
    pub date_to: Option<NaiveDate>,
}

impl RecordFilter {
    /// Filter on a single kind.
    #[must_use]
    pub fn kind(kind: TransactionKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Returns true if `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.kind.is_none_or(|k| k == record.kind)
            && self.party_id.is_none_or(|p| p == record.party_id)
            && self.date_from.is_none_or(|d| record.date >= d)
            && self.date_to.is_none_or(|d| record.date <= d)
    }
}
