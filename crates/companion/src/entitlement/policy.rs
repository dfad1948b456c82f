//! Offline fallback rule for subscription verification.

use concierge_core::SubscriptionTier;

/// Whether `tier` stays authenticated when the backend rejects it or cannot
/// be reached.
///
/// Only `free` survives. Free access is granted by lead capture rather than a
/// purchase, so there is nothing for the backend to revoke; paid tiers must be
/// reconfirmed and are signed out otherwise.
#[must_use]
pub const fn offline_fallback_allows(tier: SubscriptionTier) -> bool {
    matches!(tier, SubscriptionTier::Free)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_free_survives() {
        for tier in SubscriptionTier::ALL {
            assert_eq!(
                offline_fallback_allows(tier),
                tier == SubscriptionTier::Free,
                "{tier}"
            );
        }
    }
}
