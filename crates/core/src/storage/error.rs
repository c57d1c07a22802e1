//! Storage error types.

use thiserror::Error;

/// Errors raised while storing or linking a rendered document.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Rendered document is larger than the configured limit.
    #[error("document is {size} bytes, limit is {max}")]
    DocumentTooLarge {
        /// Document size.
        size: u64,
        /// Configured limit.
        max: u64,
    },

    /// The backend cannot produce a link for the document.
    #[error("storage backend cannot produce document links")]
    LinkUnsupported,

    /// Provider settings are unusable.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Backend failure.
    #[error("storage operation failed: {0}")]
    Backend(String),
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        if err.kind() == opendal::ErrorKind::Unsupported {
            Self::LinkUnsupported
        } else {
            Self::Backend(err.to_string())
        }
    }
}
