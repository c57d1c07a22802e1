//! Postgres-backed unit of work.
//!
//! [`DbStore::begin`] opens a database transaction; every read and write of
//! the unit runs on it. Balances and stock are adjusted with a single
//! `UPDATE ... SET col = col + delta` so the database does the arithmetic.
//! Dropping a [`DbUnitOfWork`] without committing rolls the transaction back.

mod mapping;

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tally_core::ledger::Party;
use tally_core::records::{RecordFilter, TransactionKind, TransactionRecord};
use tally_core::stock::Item;
use tally_core::store::{LedgerStore, StoreError, StoreResult, UnitOfWork};
use tally_shared::types::{ItemId, PageRequest, PartyId, TransactionId};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{items, parties, transaction_lines, transactions};
use mapping::{
    item_active, item_from_model, line_actives, party_active, party_from_model, record_active,
    record_from_model, store_error,
};

/// Store backed by a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    /// Creates a new store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl LedgerStore for DbStore {
    type Work = DbUnitOfWork;

    async fn begin(&self) -> StoreResult<DbUnitOfWork> {
        let txn = self.db.begin().await.map_err(store_error)?;
        Ok(DbUnitOfWork { txn })
    }
}

/// Unit of work over one database transaction.
pub struct DbUnitOfWork {
    txn: DatabaseTransaction,
}

impl std::fmt::Debug for DbUnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbUnitOfWork").finish_non_exhaustive()
    }
}

impl DbUnitOfWork {
    async fn lines_of(
        &self,
        ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<transaction_lines::Model>>, DbErr> {
        let mut grouped: HashMap<Uuid, Vec<transaction_lines::Model>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }
        let lines = transaction_lines::Entity::find()
            .filter(transaction_lines::Column::TransactionId.is_in(ids))
            .order_by_asc(transaction_lines::Column::Position)
            .all(&self.txn)
            .await?;
        for line in lines {
            grouped.entry(line.transaction_id).or_default().push(line);
        }
        Ok(grouped)
    }

    async fn insert_lines(&self, record: &TransactionRecord) -> StoreResult<()> {
        let lines = line_actives(record)?;
        if lines.is_empty() {
            return Ok(());
        }
        transaction_lines::Entity::insert_many(lines)
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

impl UnitOfWork for DbUnitOfWork {
    // ========== Parties ==========

    async fn find_parties_by_name(&mut self, name_key: &str) -> StoreResult<Vec<Party>> {
        let rows = parties::Entity::find()
            .filter(parties::Column::NameKey.eq(name_key))
            .order_by_asc(parties::Column::CreatedAt)
            .all(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(party_from_model).collect())
    }

    async fn get_party(&mut self, id: PartyId) -> StoreResult<Option<Party>> {
        let row = parties::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(row.map(party_from_model))
    }

    async fn list_parties(&mut self) -> StoreResult<Vec<Party>> {
        let rows = parties::Entity::find()
            .order_by_asc(parties::Column::NameKey)
            .all(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(party_from_model).collect())
    }

    async fn insert_party(&mut self, party: &Party) -> StoreResult<()> {
        party_active(party)
            .insert(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn update_party_details(&mut self, party: &Party) -> StoreResult<()> {
        let result = parties::Entity::update_many()
            .col_expr(parties::Column::Name, Expr::value(party.name.clone()))
            .col_expr(parties::Column::NameKey, Expr::value(party.key().name_key()))
            .col_expr(parties::Column::Phone, Expr::value(party.phone.clone()))
            .col_expr(parties::Column::Address, Expr::value(party.address.clone()))
            .col_expr(parties::Column::Email, Expr::value(party.email.clone()))
            .col_expr(parties::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(parties::Column::Id.eq(party.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;

        if result.rows_affected == 0 {
            return Err(StoreError::missing("party", party.id));
        }
        Ok(())
    }

    async fn adjust_party_balance(&mut self, id: PartyId, delta: Decimal) -> StoreResult<Decimal> {
        let result = parties::Entity::update_many()
            .col_expr(
                parties::Column::Balance,
                Expr::col(parties::Column::Balance).add(delta),
            )
            .col_expr(parties::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(parties::Column::Id.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;

        if result.rows_affected == 0 {
            return Err(StoreError::missing("party", id));
        }

        let balance = parties::Entity::find_by_id(id.into_inner())
            .select_only()
            .column(parties::Column::Balance)
            .into_tuple::<Decimal>()
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::missing("party", id))?;

        debug!(party_id = %id, %delta, %balance, "Party balance adjusted");
        Ok(balance)
    }

    async fn delete_party(&mut self, id: PartyId) -> StoreResult<bool> {
        let result = parties::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected > 0)
    }

    async fn count_item_lines(&mut self, name_key: &str) -> StoreResult<u64> {
        transaction_lines::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(transaction_lines::Column::ItemName)))
                    .eq(name_key),
            )
            .count(&self.txn)
            .await
            .map_err(store_error)
    }

    async fn count_party_records(&mut self, id: PartyId) -> StoreResult<u64> {
        transactions::Entity::find()
            .filter(transactions::Column::PartyId.eq(id.into_inner()))
            .count(&self.txn)
            .await
            .map_err(store_error)
    }

    // ========== Items ==========

    async fn find_item_by_name(&mut self, name_key: &str) -> StoreResult<Option<Item>> {
        items::Entity::find()
            .filter(items::Column::NameKey.eq(name_key))
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(item_from_model)
            .transpose()
    }

    async fn get_item(&mut self, id: ItemId) -> StoreResult<Option<Item>> {
        items::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(item_from_model)
            .transpose()
    }

    async fn universal_item(&mut self) -> StoreResult<Option<Item>> {
        items::Entity::find()
            .filter(items::Column::IsUniversal.eq(true))
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(item_from_model)
            .transpose()
    }

    async fn list_items(&mut self) -> StoreResult<Vec<Item>> {
        items::Entity::find()
            .order_by_asc(items::Column::NameKey)
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(item_from_model)
            .collect()
    }

    async fn insert_item(&mut self, item: &Item) -> StoreResult<()> {
        item_active(item)
            .insert(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> StoreResult<()> {
        match item_active(item).update(&self.txn).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::missing("item", item.id)),
            Err(err) => Err(store_error(err)),
        }
    }

    async fn adjust_item_stock(&mut self, id: ItemId, delta: Decimal) -> StoreResult<Decimal> {
        let result = items::Entity::update_many()
            .col_expr(items::Column::Stock, Expr::col(items::Column::Stock).add(delta))
            .col_expr(items::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(items::Column::Id.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;

        if result.rows_affected == 0 {
            return Err(StoreError::missing("item", id));
        }

        items::Entity::find_by_id(id.into_inner())
            .select_only()
            .column(items::Column::Stock)
            .into_tuple::<Decimal>()
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::missing("item", id))
    }

    async fn delete_item(&mut self, id: ItemId) -> StoreResult<bool> {
        let result = items::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected > 0)
    }

    // ========== Records ==========

    async fn reference_exists(
        &mut self,
        kind: TransactionKind,
        reference_no: &str,
        excluding: Option<TransactionId>,
    ) -> StoreResult<bool> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::Kind.eq(kind.as_str()))
            .filter(transactions::Column::ReferenceNo.eq(reference_no));
        if let Some(id) = excluding {
            query = query.filter(transactions::Column::Id.ne(id.into_inner()));
        }
        let count = query.count(&self.txn).await.map_err(store_error)?;
        Ok(count > 0)
    }

    async fn list_references(&mut self, kind: TransactionKind) -> StoreResult<Vec<String>> {
        transactions::Entity::find()
            .select_only()
            .column(transactions::Column::ReferenceNo)
            .filter(transactions::Column::Kind.eq(kind.as_str()))
            .into_tuple::<String>()
            .all(&self.txn)
            .await
            .map_err(store_error)
    }

    async fn get_record(&mut self, id: TransactionId) -> StoreResult<Option<TransactionRecord>> {
        let Some(header) = transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };

        let mut lines = self
            .lines_of(vec![header.id])
            .await
            .map_err(store_error)?;
        let own = lines.remove(&header.id).unwrap_or_default();
        record_from_model(header, own).map(Some)
    }

    async fn list_records(
        &mut self,
        filter: &RecordFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<TransactionRecord>, u64)> {
        let mut query = transactions::Entity::find();
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(party_id) = filter.party_id {
            query = query.filter(transactions::Column::PartyId.eq(party_id.into_inner()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(transactions::Column::TransactionDate.lte(to));
        }

        let total = query
            .clone()
            .count(&self.txn)
            .await
            .map_err(store_error)?;

        let headers = query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.txn)
            .await
            .map_err(store_error)?;

        let ids = headers.iter().map(|h| h.id).collect();
        let mut lines = self.lines_of(ids).await.map_err(store_error)?;

        let records = headers
            .into_iter()
            .map(|header| {
                let own = lines.remove(&header.id).unwrap_or_default();
                record_from_model(header, own)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        debug!(returned = records.len(), total, "Listed records");
        Ok((records, total))
    }

    async fn insert_record(&mut self, record: &TransactionRecord) -> StoreResult<()> {
        record_active(record)
            .insert(&self.txn)
            .await
            .map_err(store_error)?;
        self.insert_lines(record).await
    }

    async fn update_record(&mut self, record: &TransactionRecord) -> StoreResult<()> {
        match record_active(record).update(&self.txn).await {
            Ok(_) => {}
            Err(DbErr::RecordNotUpdated) => {
                return Err(StoreError::missing("transaction", record.id));
            }
            Err(err) => return Err(store_error(err)),
        }

        transaction_lines::Entity::delete_many()
            .filter(transaction_lines::Column::TransactionId.eq(record.id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        self.insert_lines(record).await
    }

    async fn delete_record(&mut self, id: TransactionId) -> StoreResult<bool> {
        // Lines go with the header via ON DELETE CASCADE.
        let result = transactions::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected > 0)
    }

    // ========== Boundary ==========

    async fn commit(self) -> StoreResult<()> {
        self.txn.commit().await.map_err(store_error)
    }
}
