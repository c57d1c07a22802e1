//! OpenDAL backed document store.

use std::time::Duration;

use opendal::{Builder, Operator, services};
use tally_shared::config::StorageProviderConfig;

use super::config::StorageConfig;
use super::error::StorageError;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Uploads rendered documents and hands out links to them.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Builds the service for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = match &config.provider {
            StorageProviderConfig::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => operator(
                services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region),
            )?,
            StorageProviderConfig::AzureBlob {
                account,
                access_key,
                container,
            } => operator(
                services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container),
            )?,
            StorageProviderConfig::LocalFs { root, .. } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::Configuration("root is not UTF-8".into()))?;
                operator(services::Fs::default().root(root))?
            }
        };
        Ok(Self { operator, config })
    }

    /// Key of a document: `documents/{folder}/{file_name}`, both sanitized.
    ///
    /// Re-rendering a record after an edit overwrites its previous document.
    #[must_use]
    pub fn document_key(folder: &str, file_name: &str) -> String {
        format!("documents/{}/{}", key_segment(folder), key_segment(file_name))
    }

    /// Writes a PDF under `key` and returns its size.
    ///
    /// # Errors
    ///
    /// Returns `DocumentTooLarge` above the configured limit, or a backend error.
    pub async fn upload_document(&self, key: &str, pdf: Vec<u8>) -> Result<u64, StorageError> {
        let size = pdf.len() as u64;
        let max = self.config.max_file_size;
        if size > max {
            return Err(StorageError::DocumentTooLarge { size, max });
        }

        self.operator
            .write_with(key, pdf)
            .content_type(PDF_CONTENT_TYPE)
            .await?;
        Ok(size)
    }

    /// Link a recipient can open.
    ///
    /// Local storage with a public base URL links directly; other backends
    /// presign a read URL valid for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `LinkUnsupported` when the backend cannot presign.
    pub async fn document_url(&self, key: &str) -> Result<String, StorageError> {
        if let StorageProviderConfig::LocalFs {
            public_base_url: Some(base),
            ..
        } = &self.config.provider
        {
            return Ok(format!("{}/{key}", base.trim_end_matches('/')));
        }

        let ttl = Duration::from_secs(self.config.link_ttl_secs);
        let presigned = self.operator.presign_read(key, ttl).await?;
        Ok(presigned.uri().to_string())
    }
}

fn operator(builder: impl Builder) -> Result<Operator, StorageError> {
    Operator::new(builder)
        .map(|b| b.finish())
        .map_err(|e| StorageError::Configuration(e.to_string()))
}

/// Replaces anything outside `[A-Za-z0-9._-]` with `_`.
fn key_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
