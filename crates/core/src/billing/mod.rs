//! Transaction record store: the billing operations.

mod error;
mod outcome;
mod service;


pub use error::BillingError;
pub use outcome::{BulkDeleteFailure, BulkDeleteReport, DeleteOutcome, TransactionOutcome};
pub use service::BillingService;
