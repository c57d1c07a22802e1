//! Document numbering.
//!
//! Invoice and bill numbers are typed by the operator and must be unique
//! among live records of their kind; deleting a record frees its number.
//! Payment numbers are allocated by the system as `PAY-000001`,
//! `PAY-000002`, and so on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tally_shared::types::TransactionId;

use crate::billing::BillingError;
use crate::records::TransactionKind;
use crate::store::UnitOfWork;

/// Longest accepted reference number.
pub const MAX_REFERENCE_LEN: usize = 50;

/// Prefix of system allocated payment numbers.
pub const PAYMENT_PREFIX: &str = "PAY-";

const PAYMENT_DIGITS: usize = 6;

/// A numbering sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberScope {
    /// Sales invoices.
    Sale,
    /// Purchase bills.
    Purchase,
    /// Payments.
    Payment,
}

impl NumberScope {
    /// Record kind numbered by this scope.
    #[must_use]
    pub const fn kind(self) -> TransactionKind {
        match self {
            Self::Sale => TransactionKind::Sale,
            Self::Purchase => TransactionKind::Purchase,
            Self::Payment => TransactionKind::Payment,
        }
    }
}

impl From<TransactionKind> for NumberScope {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Sale => Self::Sale,
            TransactionKind::Purchase => Self::Purchase,
            TransactionKind::Payment => Self::Payment,
        }
    }
}

impl fmt::Display for NumberScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

impl FromStr for NumberScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "invoice" | "invoices" => Ok(Self::Sale),
            "bill" | "bills" => Ok(Self::Purchase),
            other => other
                .parse::<TransactionKind>()
                .map(Self::from)
                .map_err(|_| format!("Unknown numbering scope: {s}")),
        }
    }
}

/// Checks that a trimmed reference is 1 to 50 characters of `[A-Za-z0-9_-]`.
///
/// # Errors
///
/// Returns `InvalidReference` describing the first problem found.
pub fn validate_format(number: &str) -> Result<(), BillingError> {
    let number = number.trim();
    if number.is_empty() {
        return Err(BillingError::InvalidReference(
            "reference number is required".to_string(),
        ));
    }
    if number.chars().count() > MAX_REFERENCE_LEN {
        return Err(BillingError::InvalidReference(format!(
            "must be at most {MAX_REFERENCE_LEN} characters"
        )));
    }
    if let Some(bad) = number
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(BillingError::InvalidReference(format!(
            "character {bad:?} is not allowed in {number}"
        )));
    }
    Ok(())
}

/// Returns true if a live record of `scope` other than `excluding` uses `number`.
///
/// # Errors
///
/// Returns a store error.
pub async fn is_number_taken<W: UnitOfWork>(
    work: &mut W,
    scope: NumberScope,
    number: &str,
    excluding: Option<TransactionId>,
) -> Result<bool, BillingError> {
    Ok(work
        .reference_exists(scope.kind(), number.trim(), excluding)
        .await?)
}

/// Splits a reference into its prefix and trailing digits.
fn split_trailing_number(reference: &str) -> (&str, &str) {
    let digits_start = reference
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map_or(reference.len(), |(i, _)| i);
    reference.split_at(digits_start)
}

/// Suggests the next number after `existing`.
///
/// Takes the reference with the greatest trailing number and increments it,
/// keeping its prefix and zero padding: `INV-009` becomes `INV-010`.
/// Returns `"1"` when no reference ends in digits.
#[must_use]
pub fn suggest_next<S: AsRef<str>>(existing: &[S]) -> String {
    existing
        .iter()
        .filter_map(|reference| {
            let reference = reference.as_ref().trim();
            let (prefix, digits) = split_trailing_number(reference);
            let value = digits.parse::<u64>().ok()?;
            Some((value, prefix, digits.len()))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map_or_else(
            || "1".to_string(),
            |(value, prefix, width)| format!("{prefix}{:0width$}", value.saturating_add(1)),
        )
}

/// Next system payment number.
#[must_use]
pub fn next_payment_number<S: AsRef<str>>(existing: &[S]) -> String {
    let next = existing
        .iter()
        .filter_map(|reference| {
            reference
                .as_ref()
                .strip_prefix(PAYMENT_PREFIX)
                .and_then(|digits| digits.parse::<u64>().ok())
        })
        .max()
        .unwrap_or(0)
        .saturating_add(1);
    format!("{PAYMENT_PREFIX}{next:0width$}", width = PAYMENT_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("INV-1")]
    #[case("  INV_2026-001 ")]
    #[case("42")]
    fn test_valid_formats(#[case] number: &str) {
        assert!(validate_format(number).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("INV 1")]
    #[case("INV/1")]
    #[case("ÍNV1")]
    fn test_invalid_formats(#[case] number: &str) {
        assert!(matches!(
            validate_format(number),
            Err(BillingError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_length_limit() {
        assert!(validate_format(&"A".repeat(MAX_REFERENCE_LEN)).is_ok());
        assert!(validate_format(&"A".repeat(MAX_REFERENCE_LEN + 1)).is_err());
    }

    #[rstest]
    #[case(&[], "1")]
    #[case(&["INV-009", "INV-003"], "INV-010")]
    #[case(&["INV-999"], "INV-1000")]
    #[case(&["7", "12", "B-3"], "13")]
    #[case(&["DRAFT"], "1")]
    #[case(&["A-2", "B-2"], "B-3")]
    fn test_suggest_next(#[case] existing: &[&str], #[case] expected: &str) {
        assert_eq!(suggest_next(existing), expected);
    }

    #[test]
    fn test_next_payment_number() {
        let none: [&str; 0] = [];
        assert_eq!(next_payment_number(&none), "PAY-000001");
        assert_eq!(
            next_payment_number(&["PAY-000009", "PAY-000002", "MANUAL"]),
            "PAY-000010"
        );
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("sales".parse::<NumberScope>().unwrap(), NumberScope::Sale);
        assert_eq!("bill".parse::<NumberScope>().unwrap(), NumberScope::Purchase);
        assert_eq!("payments".parse::<NumberScope>().unwrap(), NumberScope::Payment);
        assert!("refunds".parse::<NumberScope>().is_err());
    }

    #[test]
    fn test_split_trailing_number() {
        assert_eq!(split_trailing_number("INV-010"), ("INV-", "010"));
        assert_eq!(split_trailing_number("INV"), ("INV", ""));
        assert_eq!(split_trailing_number("123"), ("", "123"));
    }
}
