//! Application configuration management.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Stock unit and universal item configuration.
    #[serde(default)]
    pub stock: StockConfig,
    /// Company profile printed on documents.
    #[serde(default)]
    pub company: CompanyConfig,
    /// Document delivery configuration.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Stock configuration.
///
/// The bag weight is the single source for every kg to bag conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct StockConfig {
    /// Kilograms per bag (default 30).
    #[serde(default = "default_bag_weight_kg")]
    pub bag_weight_kg: Decimal,
    /// Name of the universal packaging item created at startup when missing.
    #[serde(default = "default_universal_item_name")]
    pub universal_item_name: Option<String>,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            bag_weight_kg: default_bag_weight_kg(),
            universal_item_name: default_universal_item_name(),
        }
    }
}

fn default_bag_weight_kg() -> Decimal {
    Decimal::from(30)
}

#[allow(clippy::unnecessary_wraps)]
fn default_universal_item_name() -> Option<String> {
    Some("Bardana".to_string())
}

/// Company profile configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyConfig {
    /// Company name printed in document headers.
    #[serde(default = "default_company_name")]
    pub name: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            name: default_company_name(),
            phone: None,
            address: None,
        }
    }
}

fn default_company_name() -> String {
    "My Company".to_string()
}

/// Document delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Whether rendered documents are delivered at all.
    #[serde(default)]
    pub enabled: bool,
    /// Messaging API endpoint that accepts document messages.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bearer token for the messaging API.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_delivery_timeout")]
    pub timeout_secs: u64,
    /// Lifetime of presigned document links in seconds.
    #[serde(default = "default_link_ttl")]
    pub link_ttl_secs: u64,
    /// Where rendered documents are uploaded before sending.
    #[serde(default)]
    pub storage: Option<StorageProviderConfig>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_token: None,
            timeout_secs: default_delivery_timeout(),
            link_ttl_secs: default_link_ttl(),
            storage: None,
        }
    }
}

fn default_delivery_timeout() -> u64 {
    15
}

fn default_link_ttl() -> u64 {
    7 * 24 * 60 * 60
}

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProviderConfig {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
        /// Public base URL the files are served from, if any.
        #[serde(default)]
        public_base_url: Option<String>,
    },
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__COMPANY__NAME", Some("Acme Traders")),
                ("RUN_MODE", Some("test-does-not-exist")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "postgres://localhost/tally_test");
                assert_eq!(config.company.name, "Acme Traders");
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.stock.bag_weight_kg, dec!(30));
                assert_eq!(config.stock.universal_item_name.as_deref(), Some("Bardana"));
                assert!(!config.delivery.enabled);
                assert_eq!(config.delivery.timeout_secs, 15);
                assert_eq!(config.delivery.link_ttl_secs, 604_800);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-does-not-exist")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_storage_provider_deserializes_tagged() {
        let json = r#"{"type":"local_fs","root":"/tmp/docs"}"#;
        let provider: StorageProviderConfig = serde_json::from_str(json).expect("valid provider");
        assert!(matches!(
            provider,
            StorageProviderConfig::LocalFs { ref root, public_base_url: None } if root == &PathBuf::from("/tmp/docs")
        ));
    }
}
