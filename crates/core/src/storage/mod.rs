//! Document storage over Apache OpenDAL.
//!
//! Rendered documents are uploaded here before delivery so the messaging
//! gateway can send a link instead of the bytes. Backends: S3-compatible
//! stores, Azure Blob Storage, and the local filesystem for development.

mod config;
mod error;
mod service;

pub use config::StorageConfig;
pub use error::StorageError;
pub use service::StorageService;
