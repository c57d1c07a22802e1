//! Conversions between `SeaORM` models and core domain types.

use chrono::Utc;
use sea_orm::{DbErr, Set, SqlErr};
use tally_core::ledger::Party;
use tally_core::records::{LineItem, PaymentDirection, TransactionKind, TransactionRecord};
use tally_core::stock::{Item, ItemCategory};
use tally_core::store::{StoreError, StoreResult};
use tally_shared::types::{ItemId, PartyId, TransactionId};
use uuid::Uuid;

use crate::entities::{items, parties, transaction_lines, transactions};

/// Maps a database error onto the store error the core understands.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::UniqueViolation(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            StoreError::missing("referenced row", detail)
        }
        _ => StoreError::backend(err.to_string()),
    }
}

// ========== Parties ==========

pub(crate) fn party_from_model(model: parties::Model) -> Party {
    Party {
        id: PartyId::from_uuid(model.id),
        name: model.name,
        phone: model.phone,
        address: model.address,
        email: model.email,
        balance: model.balance,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn party_active(party: &Party) -> parties::ActiveModel {
    parties::ActiveModel {
        id: Set(party.id.into_inner()),
        name: Set(party.name.clone()),
        name_key: Set(party.key().name_key()),
        phone: Set(party.phone.clone()),
        address: Set(party.address.clone()),
        email: Set(party.email.clone()),
        balance: Set(party.balance),
        created_at: Set(party.created_at.into()),
        updated_at: Set(party.updated_at.into()),
    }
}

// ========== Items ==========

pub(crate) fn item_from_model(model: items::Model) -> StoreResult<Item> {
    let category: ItemCategory = model.category.parse().map_err(StoreError::backend)?;
    Ok(Item {
        id: ItemId::from_uuid(model.id),
        name: model.name,
        category,
        stock: model.stock,
        low_stock_alert: model.low_stock_alert,
        is_universal: model.is_universal,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn item_active(item: &Item) -> items::ActiveModel {
    items::ActiveModel {
        id: Set(item.id.into_inner()),
        name: Set(item.name.clone()),
        name_key: Set(item.name_key()),
        category: Set(item.category.as_str().to_string()),
        stock: Set(item.stock),
        low_stock_alert: Set(item.low_stock_alert),
        is_universal: Set(item.is_universal),
        created_at: Set(item.created_at.into()),
        updated_at: Set(item.updated_at.into()),
    }
}

// ========== Records ==========

/// Builds a record from its header row and line rows.
pub(crate) fn record_from_model(
    model: transactions::Model,
    mut lines: Vec<transaction_lines::Model>,
) -> StoreResult<TransactionRecord> {
    let kind: TransactionKind = model.kind.parse().map_err(StoreError::backend)?;
    let direction = model
        .direction
        .as_deref()
        .map(str::parse::<PaymentDirection>)
        .transpose()
        .map_err(StoreError::backend)?;

    lines.sort_by_key(|line| line.position);

    Ok(TransactionRecord {
        id: TransactionId::from_uuid(model.id),
        kind,
        reference_no: model.reference_no,
        party_id: PartyId::from_uuid(model.party_id),
        party_name: model.party_name,
        party_phone: model.party_phone,
        date: model.transaction_date,
        direction,
        lines: lines
            .into_iter()
            .map(|line| LineItem {
                item_name: line.item_name,
                quantity_kg: line.quantity_kg,
                rate: line.rate,
                total: line.total,
            })
            .collect(),
        total_amount: model.total_amount,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn record_active(record: &TransactionRecord) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(record.id.into_inner()),
        kind: Set(record.kind.as_str().to_string()),
        reference_no: Set(record.reference_no.clone()),
        party_id: Set(record.party_id.into_inner()),
        party_name: Set(record.party_name.clone()),
        party_phone: Set(record.party_phone.clone()),
        transaction_date: Set(record.date),
        direction: Set(record.direction.map(|d| d.as_str().to_string())),
        total_amount: Set(record.total_amount),
        notes: Set(record.notes.clone()),
        created_at: Set(record.created_at.into()),
        updated_at: Set(record.updated_at.into()),
    }
}

/// Line rows of a record, numbered in input order.
pub(crate) fn line_actives(
    record: &TransactionRecord,
) -> StoreResult<Vec<transaction_lines::ActiveModel>> {
    record
        .lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let position = i32::try_from(index)
                .map_err(|_| StoreError::backend("too many line items"))?;
            Ok(transaction_lines::ActiveModel {
                id: Set(Uuid::now_v7()),
                transaction_id: Set(record.id.into_inner()),
                position: Set(position),
                item_name: Set(line.item_name.clone()),
                quantity_kg: Set(line.quantity_kg),
                rate: Set(line.rate),
                total: Set(line.total),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_core::ledger::PartyKey;

    fn sale() -> TransactionRecord {
        let now = Utc::now();
        TransactionRecord {
            id: TransactionId::new(),
            kind: TransactionKind::Sale,
            reference_no: "INV-1".to_string(),
            party_id: PartyId::new(),
            party_name: "Acme".to_string(),
            party_phone: "9000000001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            direction: None,
            lines: vec![
                LineItem {
                    item_name: "Plastic-A".to_string(),
                    quantity_kg: dec!(90),
                    rate: dec!(10),
                    total: dec!(900),
                },
                LineItem {
                    item_name: "Plastic-B".to_string(),
                    quantity_kg: dec!(10),
                    rate: dec!(5),
                    total: dec!(50),
                },
            ],
            total_amount: dec!(950),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_party_active_stores_lowercased_key() {
        let party = Party::new(&PartyKey::new("  Acme Traders ", "9000000001"));
        let active = party_active(&party);
        assert_eq!(active.name_key, Set("acme traders".to_string()));
        assert_eq!(active.name, Set("Acme Traders".to_string()));
    }

    #[test]
    fn test_lines_keep_input_order() {
        let record = sale();
        let header = transactions::Model {
            id: record.id.into_inner(),
            kind: "sale".to_string(),
            reference_no: record.reference_no.clone(),
            party_id: record.party_id.into_inner(),
            party_name: record.party_name.clone(),
            party_phone: record.party_phone.clone(),
            transaction_date: record.date,
            direction: None,
            total_amount: record.total_amount,
            notes: None,
            created_at: record.created_at.into(),
            updated_at: record.updated_at.into(),
        };
        let lines = vec![
            transaction_lines::Model {
                id: Uuid::now_v7(),
                transaction_id: record.id.into_inner(),
                position: 1,
                item_name: "Plastic-B".to_string(),
                quantity_kg: dec!(10),
                rate: dec!(5),
                total: dec!(50),
            },
            transaction_lines::Model {
                id: Uuid::now_v7(),
                transaction_id: record.id.into_inner(),
                position: 0,
                item_name: "Plastic-A".to_string(),
                quantity_kg: dec!(90),
                rate: dec!(10),
                total: dec!(900),
            },
        ];

        let rebuilt = record_from_model(header, lines).unwrap();
        assert_eq!(rebuilt.lines, record.lines);
        assert_eq!(rebuilt.kind, TransactionKind::Sale);
    }

    #[test]
    fn test_unknown_kind_is_backend_error() {
        let record = sale();
        let mut header = transactions::Model {
            id: record.id.into_inner(),
            kind: "refund".to_string(),
            reference_no: record.reference_no,
            party_id: record.party_id.into_inner(),
            party_name: record.party_name,
            party_phone: record.party_phone,
            transaction_date: record.date,
            direction: None,
            total_amount: record.total_amount,
            notes: None,
            created_at: record.created_at.into(),
            updated_at: record.updated_at.into(),
        };
        assert!(matches!(
            record_from_model(header.clone(), Vec::new()),
            Err(StoreError::Backend(_))
        ));

        header.kind = "payment".to_string();
        header.direction = Some("sideways".to_string());
        assert!(record_from_model(header, Vec::new()).is_err());
    }

    #[test]
    fn test_other_db_errors_map_to_backend() {
        let err = DbErr::Custom("boom".to_string());
        assert!(matches!(store_error(err), StoreError::Backend(_)));
    }
}
