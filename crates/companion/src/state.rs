//! Runtime state shared across the app.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::config::CompanionConfig;
use crate::currency::RatesCache;
use crate::entitlement::EntitlementStore;
use crate::geofence::{GeofenceEngine, InboxNotifier, LocationPlatform};
use crate::notifications::NotificationLog;
use crate::services::{CheckoutService, LeadCapture};
use crate::storage::{FileStore, StorageError};

/// Entitlement store wired to the live backend and the local file store.
pub type Entitlements = EntitlementStore<ApiClient, Arc<FileStore>>;

/// Error building the runtime state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to build API client: {0}")]
    Api(#[from] ApiError),
    #[error("failed to open local storage: {0}")]
    Storage(#[from] StorageError),
}

/// Shared runtime state.
///
/// This struct is cheaply cloneable via `Arc` and gives access to the API
/// client, local storage and the long-lived stores built on them.
#[derive(Clone)]
pub struct Companion {
    inner: Arc<CompanionInner>,
}

struct CompanionInner {
    config: CompanionConfig,
    api: ApiClient,
    store: Arc<FileStore>,
    entitlement: Entitlements,
    rates: RatesCache<ApiClient>,
}

impl std::fmt::Debug for Companion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Companion")
            .field("api", &self.inner.api)
            .field("storage", &self.inner.store.path())
            .finish_non_exhaustive()
    }
}

impl Companion {
    /// Build the runtime from configuration.
    ///
    /// Entitlement is left uninitialized; call
    /// [`EntitlementStore::initialize`] at boot.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or local storage
    /// cannot be opened.
    pub fn new(config: CompanionConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(&config)?;
        let store = Arc::new(FileStore::open(&config.storage_path)?);
        let entitlement = EntitlementStore::new(api.clone(), Arc::clone(&store));
        let rates = RatesCache::new(api.clone(), config.rates_refresh);

        Ok(Self {
            inner: Arc::new(CompanionInner {
                config,
                api,
                store,
                entitlement,
                rates,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CompanionConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn store(&self) -> &Arc<FileStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn entitlement(&self) -> &Entitlements {
        &self.inner.entitlement
    }

    #[must_use]
    pub fn rates(&self) -> &RatesCache<ApiClient> {
        &self.inner.rates
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationLog<Arc<FileStore>> {
        NotificationLog::new(Arc::clone(&self.inner.store))
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<ApiClient, ApiClient, Arc<FileStore>> {
        CheckoutService::new(
            self.inner.api.clone(),
            self.inner.config.plans.clone(),
            self.inner.entitlement.clone(),
        )
    }

    #[must_use]
    pub fn leads(&self) -> LeadCapture<ApiClient, ApiClient, Arc<FileStore>> {
        LeadCapture::new(
            self.inner.api.clone(),
            self.inner.entitlement.clone(),
            Arc::clone(&self.inner.store),
        )
    }

    /// Build a geofence engine over `platform` that records welcomes in the
    /// notification inbox.
    pub fn geofence<P: LocationPlatform>(
        &self,
        platform: P,
        system_notifications: bool,
    ) -> GeofenceEngine<P, InboxNotifier<Arc<FileStore>>, Arc<FileStore>> {
        GeofenceEngine::new(
            platform,
            InboxNotifier::new(Arc::clone(&self.inner.store), system_notifications),
            Arc::clone(&self.inner.store),
        )
    }
}
