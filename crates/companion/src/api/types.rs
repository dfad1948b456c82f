//! Request and response bodies for the backend API.

use concierge_core::SubscriptionTier;
use serde::{Deserialize, Serialize};

/// Response of `GET /api/subscription/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub tier: Option<String>,
}

impl VerifyResponse {
    /// The confirmed tier, if the response is valid and names a real tier.
    ///
    /// Unknown tier strings and `none` are treated as not verified.
    #[must_use]
    pub fn verified_tier(&self) -> Option<SubscriptionTier> {
        if !self.valid {
            return None;
        }
        self.tier
            .as_deref()
            .and_then(|t| t.parse::<SubscriptionTier>().ok())
            .filter(|t| *t != SubscriptionTier::None)
    }
}

/// Body of `POST /api/checkout`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest<'a> {
    pub price_id: &'a str,
}

/// Response of `POST /api/checkout`: where to send the user to pay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
}

/// Response of `GET /api/checkout/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutVerification {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

/// Error body the checkout endpoint returns alongside a failure status.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Lead-capture form submitted for the free tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub city: String,
}

/// A captured lead as listed by `GET /api/leads`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub name: String,
    pub email: String,
    pub city: String,
    #[serde(default)]
    pub created_at: Option<String>,
}
