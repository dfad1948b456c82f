//! Subscription tiers and their access ordering.

use serde::{Deserialize, Serialize};

/// Error returned when a tier string is not one of the known tiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid subscription tier: {0}")]
pub struct TierParseError(pub String);

/// Paid-access tier held by a subscriber.
///
/// Tiers are totally ordered; a feature that requires tier `T` is available to
/// any subscriber whose tier is at or above `T`:
///
/// | tier | level |
/// |---|---|
/// | `none` | 0 |
/// | `free` | 1 |
/// | `team_info` | 2 |
/// | `logistics` | 3 |
/// | `ai_concierge` | 4 |
///
/// The variant declaration order matches the level, so the derived `Ord` agrees
/// with [`SubscriptionTier::level`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    None,
    Free,
    TeamInfo,
    Logistics,
    AiConcierge,
}

impl SubscriptionTier {
    /// All tiers, lowest first.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Free,
        Self::TeamInfo,
        Self::Logistics,
        Self::AiConcierge,
    ];

    /// Numeric access level used for tier comparison.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Free => 1,
            Self::TeamInfo => 2,
            Self::Logistics => 3,
            Self::AiConcierge => 4,
        }
    }

    /// Whether a subscriber on this tier may use a feature gated at `required`.
    #[must_use]
    pub const fn grants(self, required: Self) -> bool {
        self.level() >= required.level()
    }

    /// Whether this tier is purchased (as opposed to `none` or `free`).
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::TeamInfo | Self::Logistics | Self::AiConcierge)
    }

    /// Wire and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Free => "free",
            Self::TeamInfo => "team_info",
            Self::Logistics => "logistics",
            Self::AiConcierge => "ai_concierge",
        }
    }

    /// Human-readable label, e.g. "team info".
    #[must_use]
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "free" => Ok(Self::Free),
            "team_info" => Ok(Self::TeamInfo),
            "logistics" => Ok(Self::Logistics),
            "ai_concierge" => Ok(Self::AiConcierge),
            _ => Err(TierParseError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_follow_declaration_order() {
        for pair in SubscriptionTier::ALL.windows(2) {
            let [lower, higher] = pair else { unreachable!() };
            assert!(lower < higher);
            assert!(lower.level() < higher.level());
        }
    }

    #[test]
    fn test_grants_is_monotonic() {
        for current in SubscriptionTier::ALL {
            for required in SubscriptionTier::ALL {
                if current.grants(required) {
                    for lower in SubscriptionTier::ALL.iter().filter(|t| **t <= required) {
                        assert!(current.grants(*lower), "{current} should grant {lower}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_grants_examples() {
        assert!(SubscriptionTier::Logistics.grants(SubscriptionTier::TeamInfo));
        assert!(SubscriptionTier::Free.grants(SubscriptionTier::Free));
        assert!(!SubscriptionTier::Free.grants(SubscriptionTier::TeamInfo));
        assert!(SubscriptionTier::None.grants(SubscriptionTier::None));
        assert!(!SubscriptionTier::None.grants(SubscriptionTier::Free));
    }

    #[test]
    fn test_from_str_round_trips_as_str() {
        for tier in SubscriptionTier::ALL {
            assert_eq!(tier.as_str().parse::<SubscriptionTier>().unwrap(), tier);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "premier".parse::<SubscriptionTier>().unwrap_err();
        assert_eq!(err.to_string(), "invalid subscription tier: premier");
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&SubscriptionTier::AiConcierge).unwrap();
        assert_eq!(json, "\"ai_concierge\"");
        let parsed: SubscriptionTier = serde_json::from_str("\"team_info\"").unwrap();
        assert_eq!(parsed, SubscriptionTier::TeamInfo);
    }

    #[test]
    fn test_is_paid() {
        assert!(!SubscriptionTier::None.is_paid());
        assert!(!SubscriptionTier::Free.is_paid());
        assert!(SubscriptionTier::TeamInfo.is_paid());
        assert!(SubscriptionTier::AiConcierge.is_paid());
    }

    #[test]
    fn test_label() {
        assert_eq!(SubscriptionTier::TeamInfo.label(), "team info");
    }
}
