//! Gateway construction errors.

use tally_core::storage::StorageError;
use thiserror::Error;

/// Errors raised while building the gateway from configuration.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Delivery is enabled but no endpoint is configured.
    #[error("Delivery endpoint is not configured")]
    MissingEndpoint,

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Document storage could not be initialized.
    #[error("Document storage error: {0}")]
    Storage(#[from] StorageError),
}
