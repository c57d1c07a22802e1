//! Database layer with `SeaORM` entities and the Postgres unit of work.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - [`DbStore`], the `LedgerStore` implementation over a database transaction
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod store;

pub use store::{DbStore, DbUnitOfWork};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::config::DatabaseConfig;

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
