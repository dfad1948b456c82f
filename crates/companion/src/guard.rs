//! Route guard for paywalled screens.
//!
//! The guard holds no state of its own. It derives a decision from the latest
//! [`EntitlementSnapshot`] and re-evaluates whenever the entitlement store
//! publishes a change.

use concierge_core::SubscriptionTier;
use tokio::sync::watch;

use crate::entitlement::EntitlementSnapshot;

/// Upsell destination for users without the required tier.
pub const PRICING_PATH: &str = "/pricing";

/// Tier required when a route does not name one.
pub const DEFAULT_REQUIRED_TIER: SubscriptionTier = SubscriptionTier::TeamInfo;

/// What to render for a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Entitlement is still being reconciled.
    Loading,
    Redirect(&'static str),
    Allow,
}

/// Decide access to a route gated at `required`.
#[must_use]
pub const fn evaluate(snapshot: &EntitlementSnapshot, required: SubscriptionTier) -> GuardDecision {
    if snapshot.is_loading() {
        GuardDecision::Loading
    } else if !snapshot.is_subscribed() || !snapshot.has_access(required) {
        GuardDecision::Redirect(PRICING_PATH)
    } else {
        GuardDecision::Allow
    }
}

/// A paywalled route and the tier it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectedRoute {
    pub path: &'static str,
    pub required: SubscriptionTier,
}

const fn route(path: &'static str, required: SubscriptionTier) -> ProtectedRoute {
    ProtectedRoute { path, required }
}

/// Every paywalled route in the app.
pub static PROTECTED_ROUTES: &[ProtectedRoute] = &[
    route("/home", SubscriptionTier::Free),
    route("/menu", SubscriptionTier::Free),
    route("/profile", SubscriptionTier::Free),
    route("/settings", SubscriptionTier::Free),
    route("/teams", SubscriptionTier::TeamInfo),
    route("/matches", SubscriptionTier::TeamInfo),
    route("/players", SubscriptionTier::TeamInfo),
    route("/stadium-seating", SubscriptionTier::TeamInfo),
    route("/odds", SubscriptionTier::TeamInfo),
    route("/history", SubscriptionTier::TeamInfo),
    route("/watch-hubs", SubscriptionTier::TeamInfo),
    route("/cities", SubscriptionTier::Logistics),
    route("/transportation", SubscriptionTier::Logistics),
    route("/transportation/international-flights", SubscriptionTier::Logistics),
    route("/transportation/domestic-flights", SubscriptionTier::Logistics),
    route("/transportation/rail-services", SubscriptionTier::Logistics),
    route("/transportation/bus-services", SubscriptionTier::Logistics),
    route("/transportation/car-rentals", SubscriptionTier::Logistics),
    route("/dining", SubscriptionTier::Logistics),
    route("/lodging", SubscriptionTier::Logistics),
    route("/planner", SubscriptionTier::Logistics),
    route("/critical-info", SubscriptionTier::Logistics),
    route("/critical", SubscriptionTier::Logistics),
    route("/concierge", SubscriptionTier::AiConcierge),
];

/// Tier required for `path`, or `None` for public routes.
#[must_use]
pub fn required_tier(path: &str) -> Option<SubscriptionTier> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    PROTECTED_ROUTES
        .iter()
        .find(|r| r.path == path)
        .map(|r| r.required)
}

/// A guard bound to the entitlement store's update channel.
#[derive(Debug, Clone)]
pub struct GuardedRoute {
    updates: watch::Receiver<EntitlementSnapshot>,
    required: SubscriptionTier,
}

impl GuardedRoute {
    #[must_use]
    pub const fn new(updates: watch::Receiver<EntitlementSnapshot>, required: SubscriptionTier) -> Self {
        Self { updates, required }
    }

    /// Guard `path` at its tier from [`PROTECTED_ROUTES`], or the default
    /// tier when the path is not listed.
    #[must_use]
    pub fn for_path(updates: watch::Receiver<EntitlementSnapshot>, path: &str) -> Self {
        Self::new(updates, required_tier(path).unwrap_or(DEFAULT_REQUIRED_TIER))
    }

    #[must_use]
    pub const fn required(&self) -> SubscriptionTier {
        self.required
    }

    /// Decision for the latest snapshot.
    #[must_use]
    pub fn decision(&self) -> GuardDecision {
        evaluate(&self.updates.borrow(), self.required)
    }

    /// Wait for the next entitlement change and return the new decision.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.updates.changed().await.ok()?;
        Some(evaluate(&self.updates.borrow_and_update(), self.required))
    }

    /// Wait until entitlement has finished loading and return the decision.
    pub async fn settled(&mut self) -> GuardDecision {
        let required = self.required;
        match self.updates.wait_for(|snapshot| !snapshot.is_loading()).await {
            Ok(snapshot) => evaluate(&snapshot, required),
            // Store dropped mid-load; nothing will ever authenticate.
            Err(_) => GuardDecision::Redirect(PRICING_PATH),
        }
    }
}
