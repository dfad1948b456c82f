//! Subscription state reconciled between local storage and the backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};

use concierge_core::{Email, SubscriptionTier};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use super::policy::offline_fallback_allows;
use crate::api::SubscriptionVerifier;
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::storage::{KeyValueStore, StorageError, keys};

/// Lifecycle of the entitlement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntitlementPhase {
    #[default]
    Uninitialized,
    Loading,
    Unauthenticated,
    Authenticated(SubscriptionTier),
}

/// Point-in-time view of the subscriber, published to every subscriber of
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntitlementSnapshot {
    pub phase: EntitlementPhase,
    pub email: Option<Email>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub is_verified: bool,
}

impl EntitlementSnapshot {
    /// Current tier; `none` unless authenticated.
    #[must_use]
    pub const fn tier(&self) -> SubscriptionTier {
        match self.phase {
            EntitlementPhase::Authenticated(tier) => tier,
            _ => SubscriptionTier::None,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            EntitlementPhase::Uninitialized | EntitlementPhase::Loading
        )
    }

    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        matches!(self.phase, EntitlementPhase::Authenticated(_))
    }

    /// Whether the current tier reaches `required`.
    #[must_use]
    pub const fn has_access(&self, required: SubscriptionTier) -> bool {
        self.tier().grants(required)
    }

    fn signed_out() -> Self {
        Self {
            phase: EntitlementPhase::Unauthenticated,
            ..Self::default()
        }
    }
}

/// Credentials as they were left in local storage.
#[derive(Debug)]
struct StoredCredentials {
    email: Email,
    tier: SubscriptionTier,
    name: Option<String>,
    city: Option<String>,
}

/// Entitlement store.
///
/// Cheap to clone; clones share state. Updates are published over a
/// `tokio::sync::watch` channel obtained from [`EntitlementStore::subscribe`].
pub struct EntitlementStore<V, S> {
    inner: Arc<Inner<V, S>>,
}

struct Inner<V, S> {
    verifier: V,
    store: S,
    state: watch::Sender<EntitlementSnapshot>,
    /// Held for the duration of a verification; stores the last result.
    in_flight: Mutex<Option<Verified>>,
    /// Bumped each time a verification finishes.
    completed: AtomicU64,
    /// Serializes writes to state and storage. Counts subscriber changes.
    generation: std::sync::Mutex<u64>,
}

/// Outcome of a verification and the subscriber it applied to.
#[derive(Debug, Clone, Copy)]
struct Verified {
    generation: u64,
    result: bool,
}

impl<V, S> Clone for EntitlementStore<V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, S> std::fmt::Debug for EntitlementStore<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementStore")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<V: SubscriptionVerifier, S: KeyValueStore> EntitlementStore<V, S> {
    /// Create an uninitialized store. Call [`initialize`] at boot.
    ///
    /// [`initialize`]: EntitlementStore::initialize
    pub fn new(verifier: V, store: S) -> Self {
        let (state, _) = watch::channel(EntitlementSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                verifier,
                store,
                state,
                in_flight: Mutex::new(None),
                completed: AtomicU64::new(0),
                generation: std::sync::Mutex::new(0),
            }),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> EntitlementSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receive every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EntitlementSnapshot> {
        self.inner.state.subscribe()
    }

    /// Whether the current tier reaches `required`. No side effects.
    #[must_use]
    pub fn has_access(&self, required: SubscriptionTier) -> bool {
        self.inner.state.borrow().has_access(required)
    }

    /// Reconcile persisted credentials with the backend.
    ///
    /// Runs under the verification lock, so a concurrent
    /// [`verify_subscription`](Self::verify_subscription) waits for it.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> EntitlementPhase {
        let _guard = self.inner.in_flight.lock().await;
        let generation = {
            let generation = self.lock_writes();
            self.inner
                .state
                .send_modify(|state| state.phase = EntitlementPhase::Loading);
            *generation
        };

        let stored = match self.read_credentials() {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("No stored subscription");
                return self.finish_signed_out(generation);
            }
            Err(e) => {
                AppError::from(e).report();
                return self.finish_signed_out(generation);
            }
        };

        let (tier, verified) = match self.inner.verifier.verify_subscription(&stored.email).await {
            Ok(response) => match response.verified_tier() {
                Some(tier) => (Some(tier), true),
                None if offline_fallback_allows(stored.tier) => {
                    (Some(SubscriptionTier::Free), true)
                }
                None => (None, false),
            },
            Err(e) => {
                warn!(error = %e, tier = %stored.tier, "Boot verification failed");
                if offline_fallback_allows(stored.tier) {
                    (Some(SubscriptionTier::Free), false)
                } else {
                    (None, false)
                }
            }
        };

        let mut writes = self.lock_writes();
        if *writes != generation {
            debug!("Subscriber changed during boot verification, keeping the newer state");
            return self.inner.state.borrow().phase;
        }

        let Some(tier) = tier else {
            info!(tier = %stored.tier, "Stored subscription not confirmed, signing out");
            *writes += 1;
            self.purge();
            self.inner.state.send_replace(EntitlementSnapshot::signed_out());
            return EntitlementPhase::Unauthenticated;
        };

        if verified {
            self.write(keys::SUBSCRIPTION_TIER, tier.as_str());
        }
        set_sentry_user(stored.email.as_str());
        let phase = EntitlementPhase::Authenticated(tier);
        self.inner.state.send_replace(EntitlementSnapshot {
            phase,
            email: Some(stored.email),
            name: stored.name,
            city: stored.city,
            is_verified: verified,
        });
        info!(%tier, verified, "Subscription restored");
        phase
    }

    /// Publish the signed-out state unless a subscriber was set meanwhile.
    fn finish_signed_out(&self, generation: u64) -> EntitlementPhase {
        let writes = self.lock_writes();
        if *writes == generation {
            self.inner.state.send_replace(EntitlementSnapshot::signed_out());
        }
        self.inner.state.borrow().phase
    }

    /// Record a confirmed subscription. No backend call is made.
    ///
    /// Absent `name`/`city` are removed from storage.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email or the `none` tier, and
    /// `Storage` if the subscription cannot be persisted.
    pub fn set_subscription(
        &self,
        email: &str,
        tier: SubscriptionTier,
        name: Option<&str>,
        city: Option<&str>,
    ) -> Result<()> {
        let email = Email::parse(email)?;
        if tier == SubscriptionTier::None {
            return Err(AppError::Validation(
                "A subscription needs a tier".to_string(),
            ));
        }

        let name = name.map(str::trim).filter(|s| !s.is_empty());
        let city = city.map(str::trim).filter(|s| !s.is_empty());

        let mut writes = self.lock_writes();
        *writes += 1;
        let store = &self.inner.store;
        store.set(keys::SUBSCRIPTION_EMAIL, email.as_str())?;
        store.set(keys::SUBSCRIPTION_TIER, tier.as_str())?;
        match name {
            Some(name) => store.set(keys::SUBSCRIPTION_NAME, name)?,
            None => store.remove(keys::SUBSCRIPTION_NAME)?,
        }
        match city {
            Some(city) => store.set(keys::SUBSCRIPTION_CITY, city)?,
            None => store.remove(keys::SUBSCRIPTION_CITY)?,
        }

        set_sentry_user(email.as_str());
        add_breadcrumb("subscription", "Subscription set", Some(&[("tier", tier.as_str())]));
        info!(%tier, "Subscription set");

        self.inner.state.send_replace(EntitlementSnapshot {
            phase: EntitlementPhase::Authenticated(tier),
            email: Some(email),
            name: name.map(str::to_owned),
            city: city.map(str::to_owned),
            is_verified: true,
        });
        drop(writes);
        Ok(())
    }

    /// Record a free-tier user from lead capture.
    ///
    /// # Errors
    ///
    /// See [`set_subscription`](Self::set_subscription).
    pub fn set_free_user(&self, email: &str, name: &str, city: &str) -> Result<()> {
        self.set_subscription(email, SubscriptionTier::Free, Some(name), Some(city))
    }

    /// Forget the subscriber.
    pub fn clear_subscription(&self) {
        let mut writes = self.lock_writes();
        self.clear_locked(&mut writes);
    }

    fn clear_locked(&self, generation: &mut u64) {
        *generation += 1;
        self.purge();
        clear_sentry_user();
        add_breadcrumb("subscription", "Subscription cleared", None);
        self.inner.state.send_replace(EntitlementSnapshot::signed_out());
    }

    /// Re-check the current subscriber against the backend.
    ///
    /// Calls made while a verification is running wait for it and share its
    /// result instead of issuing another request, unless the subscriber
    /// changed in the meantime.
    ///
    /// A result that arrives after the subscriber was replaced or cleared is
    /// discarded; the call then reports the state that replaced it.
    #[instrument(skip(self))]
    pub async fn verify_subscription(&self) -> bool {
        let observed = self.inner.completed.load(Ordering::Acquire);
        let mut last = self.inner.in_flight.lock().await;

        if self.inner.completed.load(Ordering::Acquire) != observed
            && let Some(verified) = *last
            && verified.generation == *self.lock_writes()
        {
            debug!(result = verified.result, "Shared in-flight verification result");
            return verified.result;
        }

        let verified = self.verify_now().await;
        *last = Some(verified);
        self.inner.completed.fetch_add(1, Ordering::Release);
        verified.result
    }

    async fn verify_now(&self) -> Verified {
        let (email, current, generation) = {
            let generation = self.lock_writes();
            let state = self.inner.state.borrow();
            (state.email.clone(), state.tier(), *generation)
        };
        let Some(email) = email else {
            return Verified {
                generation,
                result: false,
            };
        };

        let confirmed = match self.inner.verifier.verify_subscription(&email).await {
            Ok(response) => {
                let tier = response.verified_tier();
                if tier.is_none() {
                    debug!(%current, "Backend rejected subscription");
                }
                tier
            }
            Err(e) => {
                warn!(error = %e, %current, "Subscription verification failed");
                None
            }
        };

        let mut writes = self.lock_writes();
        if *writes != generation {
            debug!("Subscriber changed during verification, discarding result");
            // Tagged with the old generation so queued callers never share it.
            return Verified {
                generation,
                result: self.inner.state.borrow().is_subscribed(),
            };
        }

        let result = if let Some(tier) = confirmed {
            self.write(keys::SUBSCRIPTION_TIER, tier.as_str());
            self.inner.state.send_modify(|state| {
                state.phase = EntitlementPhase::Authenticated(tier);
                state.is_verified = true;
            });
            debug!(%tier, "Subscription verified");
            true
        } else if offline_fallback_allows(current) {
            true
        } else {
            self.clear_locked(&mut writes);
            false
        };
        Verified {
            generation: *writes,
            result,
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, u64> {
        self.inner
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read_credentials(&self) -> std::result::Result<Option<StoredCredentials>, StorageError> {
        let store = &self.inner.store;
        let (Some(email), Some(tier)) = (
            store.get(keys::SUBSCRIPTION_EMAIL)?,
            store.get(keys::SUBSCRIPTION_TIER)?,
        ) else {
            return Ok(None);
        };

        let Ok(email) = Email::parse(&email) else {
            warn!("Discarding stored subscription with malformed email");
            self.purge();
            return Ok(None);
        };

        Ok(Some(StoredCredentials {
            email,
            tier: tier.parse().unwrap_or_default(),
            name: store.get(keys::SUBSCRIPTION_NAME)?,
            city: store.get(keys::SUBSCRIPTION_CITY)?,
        }))
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.inner.store.set(key, value) {
            AppError::from(e).report();
        }
    }

    fn purge(&self) {
        for key in keys::SUBSCRIPTION {
            if let Err(e) = self.inner.store.remove(key) {
                AppError::from(e).report();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::api::{ApiError, VerifyResponse};
    use crate::storage::MemoryStore;

    /// Verifier answering every call with a fixed response.
    struct Scripted {
        response: Option<VerifyResponse>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn valid(tier: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Some(VerifyResponse {
                    valid: true,
                    tier: Some(tier.to_string()),
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn invalid() -> Arc<Self> {
            Arc::new(Self {
                response: Some(VerifyResponse {
                    valid: false,
                    tier: None,
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn offline() -> Arc<Self> {
            Arc::new(Self {
                response: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SubscriptionVerifier for Scripted {
        async fn verify_subscription(
            &self,
            _email: &Email,
        ) -> std::result::Result<VerifyResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .ok_or_else(|| ApiError::Parse("connection refused".to_string()))
        }
    }

    fn stored(tier: &str) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_entries([
            (keys::SUBSCRIPTION_EMAIL, "fan@example.com"),
            (keys::SUBSCRIPTION_TIER, tier),
            (keys::SUBSCRIPTION_NAME, "Sam"),
        ]))
    }

    #[tokio::test]
    async fn test_initialize_without_credentials() {
        let verifier = Scripted::valid("logistics");
        let store = EntitlementStore::new(verifier.clone(), Arc::new(MemoryStore::new()));
        assert!(store.snapshot().is_loading());

        assert_eq!(store.initialize().await, EntitlementPhase::Unauthenticated);
        assert!(!store.snapshot().is_loading());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_valid_updates_tier() {
        let kv = stored("team_info");
        let store = EntitlementStore::new(Scripted::valid("logistics"), kv.clone());

        assert_eq!(
            store.initialize().await,
            EntitlementPhase::Authenticated(SubscriptionTier::Logistics)
        );
        let snapshot = store.snapshot();
        assert!(snapshot.is_verified);
        assert_eq!(snapshot.name.as_deref(), Some("Sam"));
        assert_eq!(
            kv.get(keys::SUBSCRIPTION_TIER).unwrap().as_deref(),
            Some("logistics")
        );
    }

    #[tokio::test]
    async fn test_initialize_free_survives_network_failure() {
        let kv = stored("free");
        let store = EntitlementStore::new(Scripted::offline(), kv.clone());

        assert_eq!(
            store.initialize().await,
            EntitlementPhase::Authenticated(SubscriptionTier::Free)
        );
        assert!(!store.snapshot().is_verified);
        assert_eq!(kv.len(), 3);
    }

    #[tokio::test]
    async fn test_initialize_paid_rejected_purges() {
        let kv = stored("logistics");
        let store = EntitlementStore::new(Scripted::invalid(), kv.clone());

        assert_eq!(store.initialize().await, EntitlementPhase::Unauthenticated);
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_paid_offline_signs_out() {
        let kv = stored("ai_concierge");
        let store = EntitlementStore::new(Scripted::offline(), kv.clone());

        assert_eq!(store.initialize().await, EntitlementPhase::Unauthenticated);
        assert!(kv.is_empty());
    }

    #[test]
    fn test_set_subscription_normalizes_and_persists() {
        let kv = Arc::new(MemoryStore::with_entries([(keys::SUBSCRIPTION_CITY, "Old")]));
        let store = EntitlementStore::new(Scripted::offline(), kv.clone());

        store
            .set_subscription("  Fan@Example.COM ", SubscriptionTier::TeamInfo, Some("Sam"), None)
            .unwrap();

        assert_eq!(
            kv.get(keys::SUBSCRIPTION_EMAIL).unwrap().as_deref(),
            Some("fan@example.com")
        );
        assert_eq!(kv.get(keys::SUBSCRIPTION_CITY).unwrap(), None);
        assert!(store.has_access(SubscriptionTier::TeamInfo));
        assert!(!store.has_access(SubscriptionTier::Logistics));
        assert!(store.snapshot().is_verified);
    }

    #[test]
    fn test_set_subscription_rejects_bad_input() {
        let kv = Arc::new(MemoryStore::new());
        let store = EntitlementStore::new(Scripted::offline(), kv.clone());

        assert!(matches!(
            store.set_subscription("not-an-email", SubscriptionTier::Free, None, None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store.set_subscription("a@b.co", SubscriptionTier::None, None, None),
            Err(AppError::Validation(_))
        ));
        assert!(kv.is_empty());
        assert!(!store.snapshot().is_subscribed());
    }

    #[test]
    fn test_clear_subscription() {
        let kv = Arc::new(MemoryStore::new());
        let store = EntitlementStore::new(Scripted::offline(), kv.clone());
        store.set_free_user("fan@example.com", "Sam", "Dallas").unwrap();
        assert_eq!(kv.len(), 4);

        store.clear_subscription();
        assert!(kv.is_empty());
        assert_eq!(store.snapshot().phase, EntitlementPhase::Unauthenticated);
        assert!(!store.has_access(SubscriptionTier::Free));
    }

    #[tokio::test]
    async fn test_verify_without_email() {
        let verifier = Scripted::valid("free");
        let store = EntitlementStore::new(verifier.clone(), Arc::new(MemoryStore::new()));
        assert!(!store.verify_subscription().await);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verify_free_offline_stays() {
        let store = EntitlementStore::new(Scripted::offline(), Arc::new(MemoryStore::new()));
        store.set_free_user("fan@example.com", "Sam", "Dallas").unwrap();
        assert!(store.verify_subscription().await);
        assert!(store.snapshot().is_subscribed());
    }

    #[tokio::test]
    async fn test_verify_paid_rejected_clears() {
        let kv = Arc::new(MemoryStore::new());
        let store = EntitlementStore::new(Scripted::invalid(), kv.clone());
        store
            .set_subscription("fan@example.com", SubscriptionTier::Logistics, None, None)
            .unwrap();

        assert!(!store.verify_subscription().await);
        assert!(kv.is_empty());
        assert_eq!(store.snapshot().phase, EntitlementPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = EntitlementStore::new(Scripted::offline(), Arc::new(MemoryStore::new()));
        let mut rx = store.subscribe();

        store
            .set_subscription("fan@example.com", SubscriptionTier::AiConcierge, None, None)
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().tier(), SubscriptionTier::AiConcierge);
    }
}
