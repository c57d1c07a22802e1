//! What a rendered document shows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::company::CompanyProfile;
use crate::ledger::{LedgerEffect, balance_before};
use crate::records::{PaymentDirection, TransactionKind, TransactionRecord};
use crate::stock::StockPolicy;

/// The three document layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Sale.
    SaleInvoice,
    /// Purchase.
    PurchaseBill,
    /// Payment.
    PaymentReceipt,
}

impl DocumentKind {
    /// Layout for a record kind.
    #[must_use]
    pub const fn for_record(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Sale => Self::SaleInvoice,
            TransactionKind::Purchase => Self::PurchaseBill,
            TransactionKind::Payment => Self::PaymentReceipt,
        }
    }

    /// Heading printed on the document.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::SaleInvoice => "Sales Invoice",
            Self::PurchaseBill => "Purchase Bill",
            Self::PaymentReceipt => "Payment Receipt",
        }
    }

    /// File name stem and storage folder.
    #[must_use]
    pub const fn stem(self) -> &'static str {
        match self {
            Self::SaleInvoice => "invoice",
            Self::PurchaseBill => "bill",
            Self::PaymentReceipt => "receipt",
        }
    }
}

/// One printed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLine {
    /// Item name.
    pub item_name: String,
    /// Quantity in kilograms.
    pub quantity_kg: Decimal,
    /// Bags moved by the line.
    pub bags: Decimal,
    /// Price per kilogram.
    pub rate: Decimal,
    /// Line total.
    pub total: Decimal,
}

/// Everything a document prints, frozen right after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSnapshot {
    /// Layout.
    pub kind: DocumentKind,
    /// Issuing company.
    pub company: CompanyProfile,
    /// Invoice, bill, or payment number.
    pub reference_no: String,
    /// Transaction date.
    pub date: NaiveDate,
    /// Party name.
    pub party_name: String,
    /// Party phone, also the delivery recipient.
    pub party_phone: String,
    /// Lines (empty for receipts).
    pub lines: Vec<DocumentLine>,
    /// Record total.
    pub total_amount: Decimal,
    /// Party balance before this record.
    pub balance_before: Decimal,
    /// Party balance after this record.
    pub balance_after: Decimal,
    /// Payment direction (receipts only).
    pub direction: Option<PaymentDirection>,
    /// Notes.
    pub notes: Option<String>,
}

impl DocumentSnapshot {
    /// Builds a snapshot of a committed record.
    #[must_use]
    pub fn new(
        record: &TransactionRecord,
        company: &CompanyProfile,
        balance_after: Decimal,
        policy: &StockPolicy,
    ) -> Self {
        let lines = record
            .lines
            .iter()
            .map(|line| DocumentLine {
                item_name: line.item_name.clone(),
                quantity_kg: line.quantity_kg,
                bags: policy.bags_for(line.quantity_kg),
                rate: line.rate,
                total: line.total,
            })
            .collect();

        Self {
            kind: DocumentKind::for_record(record.kind),
            company: company.clone(),
            reference_no: record.reference_no.clone(),
            date: record.date,
            party_name: record.party_name.clone(),
            party_phone: record.party_phone.clone(),
            lines,
            total_amount: record.total_amount,
            balance_before: balance_before(balance_after, LedgerEffect::of(record)),
            balance_after,
            direction: record.direction,
            notes: record.notes.clone(),
        }
    }
}

/// Upload file name, e.g. `invoice-INV-1.pdf`.
#[must_use]
pub fn document_file_name(snapshot: &DocumentSnapshot) -> String {
    format!("{}-{}.pdf", snapshot.kind.stem(), snapshot.reference_no)
}

/// Message text sent with the document.
#[must_use]
pub fn delivery_message(snapshot: &DocumentSnapshot) -> String {
    let date = snapshot.date.format("%d-%m-%Y");
    let company = &snapshot.company.name;
    match snapshot.kind {
        DocumentKind::PaymentReceipt => {
            let verb = match snapshot.direction {
                Some(PaymentDirection::PaymentOut) => "paid to you",
                _ => "received from you",
            };
            format!(
                "Dear {}, {company} confirms {} {verb} on {date} (receipt {}). \
                 Previous balance: {}. Current balance: {}.",
                snapshot.party_name,
                snapshot.total_amount,
                snapshot.reference_no,
                snapshot.balance_before,
                snapshot.balance_after,
            )
        }
        kind => format!(
            "Dear {}, please find {} {} dated {date} for {} from {company}. \
             Current balance: {}.",
            snapshot.party_name,
            kind.title().to_lowercase(),
            snapshot.reference_no,
            snapshot.total_amount,
            snapshot.balance_after,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::LineItem;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tally_shared::types::{PartyId, TransactionId};

    fn company() -> CompanyProfile {
        CompanyProfile {
            name: "Acme Traders".to_string(),
            phone: None,
            address: None,
        }
    }

    fn record(kind: TransactionKind, reference_no: &str) -> TransactionRecord {
        let now = Utc::now();
        let lines = if kind.has_lines() {
            vec![LineItem {
                item_name: "Plastic-A".to_string(),
                quantity_kg: dec!(90),
                rate: dec!(10),
                total: dec!(900),
            }]
        } else {
            Vec::new()
        };
        TransactionRecord {
            id: TransactionId::new(),
            kind,
            reference_no: reference_no.to_string(),
            party_id: PartyId::new(),
            party_name: "Acme".to_string(),
            party_phone: "9000000001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            direction: (kind == TransactionKind::Payment).then_some(PaymentDirection::PaymentIn),
            lines,
            total_amount: if kind.has_lines() { dec!(900) } else { dec!(400) },
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sale_snapshot() {
        let snapshot = DocumentSnapshot::new(
            &record(TransactionKind::Sale, "INV-1"),
            &company(),
            dec!(900),
            &StockPolicy::default(),
        );
        assert_eq!(snapshot.kind, DocumentKind::SaleInvoice);
        assert_eq!(snapshot.lines[0].bags, dec!(3));
        assert_eq!(snapshot.balance_before, dec!(0));
        assert_eq!(document_file_name(&snapshot), "invoice-INV-1.pdf");
        assert!(delivery_message(&snapshot).contains("sales invoice INV-1 dated 01-03-2026"));
    }

    #[test]
    fn test_receipt_carries_previous_balance() {
        let snapshot = DocumentSnapshot::new(
            &record(TransactionKind::Payment, "PAY-000001"),
            &company(),
            dec!(500),
            &StockPolicy::default(),
        );
        assert_eq!(snapshot.balance_before, dec!(900));
        assert_eq!(document_file_name(&snapshot), "receipt-PAY-000001.pdf");
        let message = delivery_message(&snapshot);
        assert!(message.contains("400 received from you"));
        assert!(message.contains("Previous balance: 900. Current balance: 500."));
    }
}
