//! Initial database migration.
//!
//! Creates the parties, items, transactions, and transaction_lines tables
//! together with the uniqueness rules the billing core relies on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: PARTIES & ITEMS
        // ============================================================
        db.execute_unprepared(PARTIES_SQL).await?;
        db.execute_unprepared(ITEMS_SQL).await?;

        // ============================================================
        // PART 2: TRANSACTIONS
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(TRANSACTION_LINES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const PARTIES_SQL: &str = r"
CREATE TABLE parties (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    name_key VARCHAR(255) NOT NULL,
    phone VARCHAR(32) NOT NULL,
    address TEXT,
    email VARCHAR(255),
    balance NUMERIC(18, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Natural key: case-insensitive name plus phone
CREATE UNIQUE INDEX uq_parties_key ON parties(name_key, phone);
";

const ITEMS_SQL: &str = r"
CREATE TABLE items (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    name_key VARCHAR(255) NOT NULL,
    category VARCHAR(16) NOT NULL DEFAULT 'primary',
    stock NUMERIC(18, 3) NOT NULL DEFAULT 0,
    low_stock_alert NUMERIC(18, 3) NOT NULL DEFAULT 0,
    is_universal BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_item_category CHECK (category IN ('primary', 'kirana')),
    CONSTRAINT chk_item_alert CHECK (low_stock_alert >= 0)
);

CREATE UNIQUE INDEX uq_items_name_key ON items(name_key);

-- At most one universal packaging item
CREATE UNIQUE INDEX uq_items_universal ON items(is_universal) WHERE is_universal;
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    kind VARCHAR(16) NOT NULL,
    reference_no VARCHAR(50) NOT NULL,
    party_id UUID NOT NULL REFERENCES parties(id) ON DELETE RESTRICT,
    party_name VARCHAR(255) NOT NULL,
    party_phone VARCHAR(32) NOT NULL,
    transaction_date DATE NOT NULL,
    direction VARCHAR(16),
    total_amount NUMERIC(18, 2) NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_kind CHECK (kind IN ('sale', 'purchase', 'payment')),
    CONSTRAINT chk_payment_direction CHECK (
        (kind = 'payment' AND direction IN ('payment-in', 'payment-out'))
        OR (kind <> 'payment' AND direction IS NULL)
    ),
    CONSTRAINT chk_total_positive CHECK (total_amount > 0)
);

-- Reference numbers are unique per kind; deleting a record frees its number
CREATE UNIQUE INDEX uq_transactions_reference ON transactions(kind, reference_no);

CREATE INDEX idx_transactions_party ON transactions(party_id);
CREATE INDEX idx_transactions_listing ON transactions(kind, transaction_date DESC, created_at DESC);
";

const TRANSACTION_LINES_SQL: &str = r"
CREATE TABLE transaction_lines (
    id UUID PRIMARY KEY,
    transaction_id UUID NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    item_name VARCHAR(255) NOT NULL,
    quantity_kg NUMERIC(18, 3) NOT NULL,
    rate NUMERIC(18, 2) NOT NULL,
    total NUMERIC(18, 2) NOT NULL,
    CONSTRAINT chk_line_positive CHECK (quantity_kg > 0 AND rate > 0),
    CONSTRAINT uq_line_position UNIQUE (transaction_id, position)
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transaction_lines CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS items CASCADE;
DROP TABLE IF EXISTS parties CASCADE;
";
