//! Paid plan checkout and purchase restore.
//!
//! The payment provider's hosted page is reached through the backend: it
//! creates a session for a plan's price id, and after payment it reports the
//! session's outcome. Only then is the subscription recorded locally.

use concierge_core::{Email, SubscriptionTier};
use tracing::{info, instrument, warn};

use crate::api::{ApiError, CheckoutGateway, SubscriptionVerifier};
use crate::config::PlanCatalog;
use crate::entitlement::EntitlementStore;
use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;

/// Checkout flow over the backend API.
#[derive(Debug, Clone)]
pub struct CheckoutService<A, V, S> {
    api: A,
    plans: PlanCatalog,
    entitlement: EntitlementStore<V, S>,
}

impl<A, V, S> CheckoutService<A, V, S>
where
    A: CheckoutGateway + SubscriptionVerifier,
    V: SubscriptionVerifier,
    S: KeyValueStore,
{
    pub const fn new(api: A, plans: PlanCatalog, entitlement: EntitlementStore<V, S>) -> Self {
        Self {
            api,
            plans,
            entitlement,
        }
    }

    /// Create a checkout session for `tier` and return the payment URL.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unpaid tier (free is claimed through lead
    /// capture), `NotFound` for a paid tier without a price id, or `Network`
    /// if the backend fails.
    #[instrument(skip(self))]
    pub async fn start_checkout(&self, tier: SubscriptionTier) -> Result<String> {
        if !tier.is_paid() {
            return Err(AppError::Validation(match tier {
                SubscriptionTier::Free => {
                    "The free plan is unlocked by downloading the bracket.".to_string()
                }
                _ => "Choose a plan to continue.".to_string(),
            }));
        }

        let price_id = self
            .plans
            .plan(tier)
            .and_then(|plan| plan.price_id.as_deref())
            .ok_or_else(|| AppError::NotFound(format!("No plan for the {} tier", tier.label())))?;

        let session = self.api.create_checkout_session(price_id).await?;
        if session.url.is_empty() {
            return Err(ApiError::Parse("No checkout URL in response".to_string()).into());
        }

        info!(%tier, "Checkout session created");
        Ok(session.url)
    }

    /// Record the subscription bought in checkout session `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session did not complete with a known tier,
    /// or `Network` if the backend fails.
    #[instrument(skip(self))]
    pub async fn complete_checkout(&self, session_id: &str) -> Result<SubscriptionTier> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(AppError::Validation("Missing checkout session".to_string()));
        }

        let outcome = self.api.verify_checkout_session(session_id).await?;
        let tier = outcome
            .tier
            .as_deref()
            .and_then(|tier| tier.parse::<SubscriptionTier>().ok())
            .filter(|tier| *tier != SubscriptionTier::None);

        match (outcome.success, outcome.email, tier) {
            (true, Some(email), Some(tier)) => {
                self.record(&email, tier)?;
                info!(%tier, "Checkout completed");
                Ok(tier)
            }
            (success, _, _) => {
                warn!(success, tier = ?outcome.tier, "Checkout session not usable");
                Err(AppError::NotFound(
                    "This checkout session did not complete a purchase.".to_string(),
                ))
            }
        }
    }

    /// Restore a purchase made on another device.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email, `NotFound` when the
    /// backend knows no purchase for it, or `Network` if the backend fails.
    #[instrument(skip(self, email))]
    pub async fn restore_purchase(&self, email: &str) -> Result<SubscriptionTier> {
        let email = Email::parse(email)?;
        let response = self.api.verify_subscription(&email).await?;

        let Some(tier) = response.verified_tier() else {
            return Err(AppError::NotFound(
                "We couldn't find a purchase with that email address.".to_string(),
            ));
        };

        self.record(email.as_str(), tier)?;
        info!(%tier, "Purchase restored");
        Ok(tier)
    }

    /// Set the subscription, keeping the profile fields of the same user.
    fn record(&self, email: &str, tier: SubscriptionTier) -> Result<()> {
        let current = self.entitlement.snapshot();
        let same_user = current
            .email
            .as_ref()
            .is_some_and(|known| known.as_str() == concierge_core::email::normalize(email));
        let (name, city) = if same_user {
            (current.name, current.city)
        } else {
            (None, None)
        };

        self.entitlement
            .set_subscription(email, tier, name.as_deref(), city.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::{CheckoutSession, CheckoutVerification, VerifyResponse};
    use crate::storage::MemoryStore;

    /// Backend that approves everything for one known buyer.
    struct Backend;

    impl CheckoutGateway for Backend {
        async fn create_checkout_session(
            &self,
            price_id: &str,
        ) -> std::result::Result<CheckoutSession, ApiError> {
            Ok(CheckoutSession {
                url: format!("https://pay.example/{price_id}"),
            })
        }

        async fn verify_checkout_session(
            &self,
            session_id: &str,
        ) -> std::result::Result<CheckoutVerification, ApiError> {
            Ok(CheckoutVerification {
                success: session_id == "cs_paid",
                email: Some("Buyer@Example.com".to_string()),
                tier: Some("logistics".to_string()),
            })
        }
    }

    impl SubscriptionVerifier for Backend {
        async fn verify_subscription(
            &self,
            email: &Email,
        ) -> std::result::Result<VerifyResponse, ApiError> {
            let known = email.as_str() == "buyer@example.com";
            Ok(VerifyResponse {
                valid: known,
                tier: known.then(|| "team_info".to_string()),
            })
        }
    }

    fn service() -> CheckoutService<Backend, Arc<Backend>, Arc<MemoryStore>> {
        let entitlement = EntitlementStore::new(Arc::new(Backend), Arc::new(MemoryStore::new()));
        CheckoutService::new(Backend, PlanCatalog::default(), entitlement)
    }

    #[tokio::test]
    async fn test_start_checkout_paid_tier() {
        let url = service()
            .start_checkout(SubscriptionTier::TeamInfo)
            .await
            .unwrap();
        assert!(url.starts_with("https://pay.example/price_"));
    }

    #[tokio::test]
    async fn test_start_checkout_rejects_free_and_none() {
        let service = service();
        assert!(matches!(
            service.start_checkout(SubscriptionTier::Free).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.start_checkout(SubscriptionTier::None).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_checkout() {
        let service = service();
        assert_eq!(
            service.complete_checkout("cs_paid").await.unwrap(),
            SubscriptionTier::Logistics
        );
        assert!(service.entitlement.has_access(SubscriptionTier::Logistics));
    }

    #[tokio::test]
    async fn test_complete_unpaid_checkout() {
        let service = service();
        assert!(matches!(
            service.complete_checkout("cs_abandoned").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.complete_checkout("  ").await,
            Err(AppError::Validation(_))
        ));
        assert!(!service.entitlement.snapshot().is_subscribed());
    }

    #[tokio::test]
    async fn test_restore_purchase_keeps_profile() {
        let service = service();
        service
            .entitlement
            .set_free_user("buyer@example.com", "Sam", "Dallas")
            .unwrap();

        let tier = service.restore_purchase(" BUYER@example.com").await.unwrap();
        assert_eq!(tier, SubscriptionTier::TeamInfo);

        let snapshot = service.entitlement.snapshot();
        assert_eq!(snapshot.tier(), SubscriptionTier::TeamInfo);
        assert_eq!(snapshot.name.as_deref(), Some("Sam"));
    }

    #[tokio::test]
    async fn test_restore_unknown_purchase() {
        let service = service();
        assert!(matches!(
            service.restore_purchase("stranger@example.com").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.restore_purchase("nope").await,
            Err(AppError::Validation(_))
        ));
    }
}
