//! Company profile printed on documents.
//!
//! The profile is read through a cache. Whoever changes the company
//! settings calls [`CompanyProfileCache::invalidate`] so the next document
//! picks up the new values.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tally_shared::config::CompanyConfig;
use thiserror::Error;
use tracing::debug;

/// Default time-to-live for the cached profile (10 minutes).
const DEFAULT_TTL_SECS: u64 = 600;

/// Company details shown in document headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Company name.
    pub name: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

impl From<&CompanyConfig> for CompanyProfile {
    fn from(config: &CompanyConfig) -> Self {
        Self {
            name: config.name.clone(),
            phone: config.phone.clone(),
            address: config.address.clone(),
        }
    }
}

/// Errors fetching the company profile.
#[derive(Debug, Clone, Error)]
pub enum CompanyError {
    /// The source could not produce a profile.
    #[error("Company profile unavailable: {0}")]
    Unavailable(String),
}

/// Where the company profile comes from.
#[async_trait]
pub trait CompanyProfileSource: Send + Sync {
    /// Fetches the current profile.
    async fn fetch(&self) -> Result<CompanyProfile, CompanyError>;
}

/// Profile fixed at startup from configuration.
#[derive(Debug, Clone)]
pub struct StaticProfileSource {
    profile: CompanyProfile,
}

impl StaticProfileSource {
    /// Wraps a fixed profile.
    #[must_use]
    pub fn new(profile: CompanyProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl CompanyProfileSource for StaticProfileSource {
    async fn fetch(&self) -> Result<CompanyProfile, CompanyError> {
        Ok(self.profile.clone())
    }
}

/// Read-through cache over a [`CompanyProfileSource`].
#[derive(Clone)]
pub struct CompanyProfileCache {
    source: Arc<dyn CompanyProfileSource>,
    cache: Cache<(), Arc<CompanyProfile>>,
}

impl CompanyProfileCache {
    /// Creates a cache with the default TTL.
    #[must_use]
    pub fn new(source: Arc<dyn CompanyProfileSource>) -> Self {
        Self::with_ttl(source, Duration::from_secs(DEFAULT_TTL_SECS))
    }

    /// Creates a cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(source: Arc<dyn CompanyProfileSource>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { source, cache }
    }

    /// Cache over a static profile from configuration.
    #[must_use]
    pub fn from_config(config: &CompanyConfig) -> Self {
        Self::new(Arc::new(StaticProfileSource::new(CompanyProfile::from(
            config,
        ))))
    }

    /// Returns the profile, fetching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the source error when the profile is not cached and cannot
    /// be fetched.
    pub async fn profile(&self) -> Result<Arc<CompanyProfile>, CompanyError> {
        let source = Arc::clone(&self.source);
        self.cache
            .try_get_with((), async move {
                debug!("Fetching company profile");
                source.fetch().await.map(Arc::new)
            })
            .await
            .map_err(|err| (*err).clone())
    }

    /// Drops the cached profile; the next read refetches it.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        name: Mutex<String>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl CompanyProfileSource for CountingSource {
        async fn fetch(&self) -> Result<CompanyProfile, CompanyError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(CompanyProfile {
                name: self.name.lock().unwrap().clone(),
                phone: None,
                address: None,
            })
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CompanyProfileSource for FailingSource {
        async fn fetch(&self) -> Result<CompanyProfile, CompanyError> {
            Err(CompanyError::Unavailable("settings table missing".into()))
        }
    }

    #[tokio::test]
    async fn test_profile_cached_until_invalidated() {
        let source = Arc::new(CountingSource {
            name: Mutex::new("Acme Traders".to_string()),
            fetches: AtomicUsize::new(0),
        });
        let cache = CompanyProfileCache::new(source.clone());

        assert_eq!(cache.profile().await.unwrap().name, "Acme Traders");
        assert_eq!(cache.profile().await.unwrap().name, "Acme Traders");
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        *source.name.lock().unwrap() = "Acme Traders Pvt".to_string();
        assert_eq!(cache.profile().await.unwrap().name, "Acme Traders");

        cache.invalidate();
        assert_eq!(cache.profile().await.unwrap().name, "Acme Traders Pvt");
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = CompanyProfileCache::new(Arc::new(FailingSource));
        assert!(cache.profile().await.is_err());
        assert!(cache.profile().await.is_err());
    }

    #[tokio::test]
    async fn test_from_config() {
        let cache = CompanyProfileCache::from_config(&CompanyConfig::default());
        assert_eq!(cache.profile().await.unwrap().name, "My Company");
    }
}
