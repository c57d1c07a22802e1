//! Storage configuration types.

use tally_shared::config::StorageProviderConfig;

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProviderConfig,
    /// Maximum document size in bytes.
    pub max_file_size: u64,
    /// Presigned download URL TTL in seconds.
    pub link_ttl_secs: u64,
}

impl StorageConfig {
    /// Default max document size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default link TTL: 7 days.
    pub const DEFAULT_LINK_TTL: u64 = 7 * 24 * 60 * 60;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProviderConfig) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            link_ttl_secs: Self::DEFAULT_LINK_TTL,
        }
    }

    /// Set maximum document size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set presigned link TTL.
    #[must_use]
    pub fn with_link_ttl(mut self, secs: u64) -> Self {
        self.link_ttl_secs = secs;
        self
    }

    /// Provider name for logs.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            StorageProviderConfig::S3 { .. } => "s3",
            StorageProviderConfig::AzureBlob { .. } => "azure_blob",
            StorageProviderConfig::LocalFs { .. } => "local",
        }
    }
}
