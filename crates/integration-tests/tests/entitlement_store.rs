//! Integration tests for subscription entitlement.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use concierge_companion::entitlement::{EntitlementPhase, EntitlementStore};
use concierge_companion::storage::{KeyValueStore, MemoryStore, keys};
use concierge_core::SubscriptionTier;
use concierge_integration_tests::{FakeBackend, stored_subscription};

const FAN: &str = "fan@example.com";

type Store = EntitlementStore<Arc<FakeBackend>, Arc<MemoryStore>>;

fn store(backend: &Arc<FakeBackend>, storage: &Arc<MemoryStore>) -> Store {
    EntitlementStore::new(Arc::clone(backend), Arc::clone(storage))
}

// =============================================================================
// Boot Reconciliation Tests
// =============================================================================

#[tokio::test]
async fn test_boot_confirms_and_upgrades_tier() {
    let backend = FakeBackend::new();
    backend.set_subscription(FAN, Some("logistics"));
    let storage = stored_subscription(FAN, "team_info");
    let entitlement = store(&backend, &storage);

    let phase = entitlement.initialize().await;

    assert_eq!(phase, EntitlementPhase::Authenticated(SubscriptionTier::Logistics));
    let snapshot = entitlement.snapshot();
    assert!(snapshot.is_verified);
    assert_eq!(snapshot.name.as_deref(), Some("Sam"));
    assert_eq!(
        storage.get(keys::SUBSCRIPTION_TIER).unwrap().as_deref(),
        Some("logistics")
    );
}

#[tokio::test]
async fn test_boot_offline_paid_user_is_signed_out() {
    let backend = FakeBackend::new();
    let storage = stored_subscription(FAN, "ai_concierge");
    let entitlement = store(&backend, &storage);

    assert_eq!(entitlement.initialize().await, EntitlementPhase::Unauthenticated);
    assert!(!entitlement.has_access(SubscriptionTier::Free));
    for key in keys::SUBSCRIPTION {
        assert_eq!(storage.get(key).unwrap(), None, "{key} should be purged");
    }
}

#[tokio::test]
async fn test_boot_offline_free_user_keeps_free_access() {
    let backend = FakeBackend::new();
    let storage = stored_subscription(FAN, "free");
    let entitlement = store(&backend, &storage);

    assert_eq!(
        entitlement.initialize().await,
        EntitlementPhase::Authenticated(SubscriptionTier::Free)
    );
    assert!(!entitlement.snapshot().is_verified);
    assert!(entitlement.has_access(SubscriptionTier::Free));
    assert!(!entitlement.has_access(SubscriptionTier::TeamInfo));
}

#[tokio::test]
async fn test_boot_without_credentials_skips_backend() {
    let backend = FakeBackend::new();
    let entitlement = store(&backend, &Arc::new(MemoryStore::new()));

    assert_eq!(entitlement.initialize().await, EntitlementPhase::Unauthenticated);
    assert_eq!(backend.verify_calls(), 0);
}

// =============================================================================
// Verification Tests
// =============================================================================

#[tokio::test]
async fn test_lapsed_subscription_is_cleared_on_verify() {
    let backend = FakeBackend::new();
    backend.set_subscription(FAN, Some("team_info"));
    let storage = stored_subscription(FAN, "team_info");
    let entitlement = store(&backend, &storage);
    entitlement.initialize().await;

    backend.set_subscription(FAN, None);
    assert!(!entitlement.verify_subscription().await);

    assert_eq!(entitlement.snapshot().phase, EntitlementPhase::Unauthenticated);
    assert_eq!(storage.get(keys::SUBSCRIPTION_EMAIL).unwrap(), None);
}

#[tokio::test]
async fn test_free_user_survives_outage_on_verify() {
    let backend = FakeBackend::new();
    let storage = Arc::new(MemoryStore::new());
    let entitlement = store(&backend, &storage);
    entitlement.set_free_user(FAN, "Sam", "Seattle").unwrap();

    backend.go_offline(FAN);
    assert!(entitlement.verify_subscription().await);
    assert_eq!(entitlement.snapshot().tier(), SubscriptionTier::Free);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verifications_share_one_request() {
    let backend = FakeBackend::new();
    backend.set_subscription(FAN, Some("ai_concierge"));
    backend.slow_verify(Duration::from_millis(200));
    let entitlement = store(&backend, &Arc::new(MemoryStore::new()));
    entitlement
        .set_subscription(FAN, SubscriptionTier::AiConcierge, None, None)
        .unwrap();

    let leader = {
        let entitlement = entitlement.clone();
        tokio::spawn(async move { entitlement.verify_subscription().await })
    };
    // Let the first call take the lock before the others queue behind it.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let followers: Vec<_> = (0..4)
        .map(|_| {
            let entitlement = entitlement.clone();
            tokio::spawn(async move { entitlement.verify_subscription().await })
        })
        .collect();

    assert!(leader.await.unwrap());
    for follower in followers {
        assert!(follower.await.unwrap());
    }
    assert_eq!(backend.verify_calls(), 1);
}

#[tokio::test]
async fn test_sequential_verifications_each_hit_backend() {
    let backend = FakeBackend::new();
    backend.set_subscription(FAN, Some("team_info"));
    let entitlement = store(&backend, &Arc::new(MemoryStore::new()));
    entitlement
        .set_subscription(FAN, SubscriptionTier::TeamInfo, None, None)
        .unwrap();

    assert!(entitlement.verify_subscription().await);
    assert!(entitlement.verify_subscription().await);
    assert_eq!(backend.verify_calls(), 2);
}

#[tokio::test]
async fn test_sign_out_during_verification_wins() {
    let backend = FakeBackend::new();
    backend.set_subscription(FAN, Some("logistics"));
    backend.slow_verify(Duration::from_millis(200));
    let storage = Arc::new(MemoryStore::new());
    let entitlement = store(&backend, &storage);
    entitlement
        .set_subscription(FAN, SubscriptionTier::TeamInfo, None, None)
        .unwrap();

    let pending = {
        let entitlement = entitlement.clone();
        tokio::spawn(async move { entitlement.verify_subscription().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    entitlement.clear_subscription();

    assert!(!pending.await.unwrap());
    let snapshot = entitlement.snapshot();
    assert_eq!(snapshot.phase, EntitlementPhase::Unauthenticated);
    assert_eq!(snapshot.email, None);
    for key in keys::SUBSCRIPTION {
        assert_eq!(storage.get(key).unwrap(), None, "{key} should stay cleared");
    }
}

#[tokio::test]
async fn test_new_subscriber_during_verification_keeps_own_tier() {
    const OTHER: &str = "other@example.com";
    let backend = FakeBackend::new();
    backend.set_subscription(FAN, Some("ai_concierge"));
    backend.set_subscription(OTHER, Some("team_info"));
    backend.slow_verify(Duration::from_millis(200));
    let storage = Arc::new(MemoryStore::new());
    let entitlement = store(&backend, &storage);
    entitlement
        .set_subscription(FAN, SubscriptionTier::AiConcierge, None, None)
        .unwrap();

    let first = {
        let entitlement = entitlement.clone();
        tokio::spawn(async move { entitlement.verify_subscription().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    entitlement
        .set_subscription(OTHER, SubscriptionTier::TeamInfo, None, None)
        .unwrap();
    // Queued behind the first call, but for a different subscriber.
    let second = {
        let entitlement = entitlement.clone();
        tokio::spawn(async move { entitlement.verify_subscription().await })
    };

    assert!(first.await.unwrap());
    assert!(second.await.unwrap());
    assert_eq!(backend.verify_calls(), 2);

    let snapshot = entitlement.snapshot();
    assert_eq!(snapshot.tier(), SubscriptionTier::TeamInfo);
    assert_eq!(snapshot.email.unwrap().as_str(), OTHER);
    assert_eq!(
        storage.get(keys::SUBSCRIPTION_TIER).unwrap().as_deref(),
        Some("team_info")
    );
}

// =============================================================================
// Observation Tests
// =============================================================================

#[tokio::test]
async fn test_subscribers_see_every_change() {
    let backend = FakeBackend::new();
    let entitlement = store(&backend, &Arc::new(MemoryStore::new()));
    let mut updates = entitlement.subscribe();

    entitlement
        .set_subscription(FAN, SubscriptionTier::TeamInfo, Some("Sam"), None)
        .unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().tier(), SubscriptionTier::TeamInfo);

    entitlement.clear_subscription();
    updates.changed().await.unwrap();
    assert!(!updates.borrow_and_update().is_subscribed());
}
