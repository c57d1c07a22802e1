//! Billing error types.
//!
//! Every failure of a create, update, or delete surfaces as a
//! [`BillingError`]. Delivery failures never appear here: they are folded
//! into the outcome as a failed delivery status.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{ItemId, PartyId, TransactionId};
use thiserror::Error;

use crate::records::TransactionKind;
use crate::store::StoreError;

/// Errors that can occur during billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    // ========== Validation Errors ==========
    /// A required field is blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Reference number is empty, too long, or uses a character outside `[A-Za-z0-9_-]`.
    #[error("Invalid reference number: {0}")]
    InvalidReference(String),

    /// Sale or purchase has no lines.
    #[error("At least one line item is required")]
    NoLines,

    /// A line failed validation.
    #[error("Line {line}: {reason}")]
    InvalidLine {
        /// One-based line number.
        line: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Payment amount must be positive.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount out of range or finer than two decimals.
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The rejected amount.
        amount: Decimal,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A line names an item that does not exist.
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// The universal flag is fixed at creation.
    #[error("The universal flag of an item cannot be changed")]
    UniversalFlagChange,

    /// Item fields failed validation.
    #[error("Invalid item: {0}")]
    InvalidItem(&'static str),

    // ========== Conflict Errors ==========
    /// Reference number already used by a live record of the same kind.
    #[error("{} {reference_no} already exists", kind.reference_label())]
    DuplicateReference {
        /// Record kind.
        kind: TransactionKind,
        /// The clashing number.
        reference_no: String,
    },

    /// Another party already has this name and phone.
    #[error("Party {name} ({phone}) already exists")]
    DuplicateParty {
        /// Party name.
        name: String,
        /// Party phone.
        phone: String,
    },

    /// Another item already has this name.
    #[error("Item {0} already exists")]
    DuplicateItem(String),

    /// A universal item already exists.
    #[error("Universal item already exists: {0}")]
    UniversalItemExists(String),

    /// The universal item cannot be deleted.
    #[error("Universal item {0} cannot be deleted")]
    UniversalItemProtected(String),

    /// Party is still referenced by records.
    #[error("Party {id} is referenced by {records} record(s)")]
    PartyInUse {
        /// The party.
        id: PartyId,
        /// Number of referencing records.
        records: u64,
    },

    /// Item is named by record lines and cannot be renamed.
    #[error("Item {name} is used by {lines} line(s)")]
    ItemInUse {
        /// Current item name.
        name: String,
        /// Number of referencing lines.
        lines: u64,
    },

    // ========== Not Found Errors ==========
    /// Record not found (or not of the expected kind).
    #[error("{kind} not found: {id}")]
    TransactionNotFound {
        /// Expected kind.
        kind: TransactionKind,
        /// Requested ID.
        id: TransactionId,
    },

    /// Party not found.
    #[error("Party not found: {0}")]
    PartyNotFound(PartyId),

    /// Item not found.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    // ========== Store Errors ==========
    /// Persistence failure inside the unit of work.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BillingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidReference(_) => "INVALID_REFERENCE",
            Self::NoLines => "NO_LINES",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::UnknownItem(_) => "UNKNOWN_ITEM",
            Self::UniversalFlagChange => "UNIVERSAL_FLAG_CHANGE",
            Self::InvalidItem(_) => "INVALID_ITEM",
            Self::DuplicateReference { .. } => "DUPLICATE_REFERENCE",
            Self::DuplicateParty { .. } => "DUPLICATE_PARTY",
            Self::DuplicateItem(_) => "DUPLICATE_ITEM",
            Self::UniversalItemExists(_) => "UNIVERSAL_ITEM_EXISTS",
            Self::UniversalItemProtected(_) => "UNIVERSAL_ITEM_PROTECTED",
            Self::PartyInUse { .. } => "PARTY_IN_USE",
            Self::ItemInUse { .. } => "ITEM_IN_USE",
            Self::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            Self::PartyNotFound(_) => "PARTY_NOT_FOUND",
            Self::ItemNotFound(_) => "ITEM_NOT_FOUND",
            Self::Store(StoreError::MissingRow { .. }) => "CONSISTENCY_ERROR",
            Self::Store(StoreError::UniqueViolation(_)) => "CONFLICT",
            Self::Store(StoreError::Backend(_)) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::MissingField(_)
            | Self::InvalidReference(_)
            | Self::NoLines
            | Self::InvalidLine { .. }
            | Self::NonPositiveAmount(_)
            | Self::InvalidAmount { .. }
            | Self::UnknownItem(_)
            | Self::UniversalFlagChange
            | Self::InvalidItem(_) => 400,

            // 404 Not Found
            Self::TransactionNotFound { .. } | Self::PartyNotFound(_) | Self::ItemNotFound(_) => {
                404
            }

            // 409 Conflict
            Self::DuplicateReference { .. }
            | Self::DuplicateParty { .. }
            | Self::DuplicateItem(_)
            | Self::UniversalItemExists(_)
            | Self::UniversalItemProtected(_)
            | Self::PartyInUse { .. }
            | Self::ItemInUse { .. }
            | Self::Store(StoreError::UniqueViolation(_)) => 409,

            // 500 Internal Server Error
            Self::Store(StoreError::MissingRow { .. } | StoreError::Backend(_)) => 500,
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        let message = err.to_string();
        match err.http_status_code() {
            400 => Self::Validation(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => match err {
                BillingError::Store(StoreError::MissingRow { .. }) => Self::Consistency(message),
                _ => Self::Database(message),
            },
        }
    }
}
