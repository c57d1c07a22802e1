//! Core business logic for Tally.
//!
//! This crate contains the billing rules with ZERO web or database dependencies.
//! Persistence is reached through the [`store::LedgerStore`] trait; the
//! in-memory implementation backs the tests.
//!
//! # Modules
//!
//! - `billing` - Sales, purchases, and payments as atomic units
//! - `ledger` - Parties and their running balances
//! - `stock` - Items, bag counts, and the universal packaging item
//! - `numbering` - Invoice, bill, and payment numbers
//! - `records` - Transaction record types and input validation
//! - `document` - PDF rendering and best-effort delivery
//! - `company` - Cached company profile for documents
//! - `storage` - Object storage for generated documents
//! - `store` - Unit-of-work persistence seam

pub mod billing;
pub mod company;
pub mod document;
pub mod ledger;
pub mod numbering;
pub mod records;
pub mod stock;
pub mod storage;
pub mod store;

pub use billing::{BillingError, BillingService};
pub use store::{LedgerStore, StoreError, UnitOfWork};
