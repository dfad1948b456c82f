//! Free bracket downloads gated by lead capture.

use concierge_core::Email;
use tracing::{info, instrument, warn};

use crate::api::{LeadForm, LeadSink, SubscriptionVerifier};
use crate::entitlement::EntitlementStore;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::storage::{KeyValueStore, keys};

/// Free bracket downloads allowed per device.
pub const MAX_FREE_DOWNLOADS: u32 = 2;

/// Lead capture for the free tier.
#[derive(Debug, Clone)]
pub struct LeadCapture<L, V, S> {
    sink: L,
    entitlement: EntitlementStore<V, S>,
    store: S,
}

impl<L, V, S> LeadCapture<L, V, S>
where
    L: LeadSink,
    V: SubscriptionVerifier,
    S: KeyValueStore,
{
    /// `store` holds the download counter; it is normally the same store the
    /// entitlement uses.
    pub const fn new(sink: L, entitlement: EntitlementStore<V, S>, store: S) -> Self {
        Self {
            sink,
            entitlement,
            store,
        }
    }

    /// Downloads used on this device. Unreadable counters read as zero.
    #[must_use]
    pub fn downloads_used(&self) -> u32 {
        match self.store.get(keys::BRACKET_DOWNLOADS) {
            Ok(Some(count)) => count.trim().parse().unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "Failed to read download counter");
                0
            }
        }
    }

    #[must_use]
    pub fn remaining_downloads(&self) -> u32 {
        MAX_FREE_DOWNLOADS.saturating_sub(self.downloads_used())
    }

    /// Capture a lead and grant one free download.
    ///
    /// The user becomes a free-tier subscriber only once the backend has
    /// accepted the lead. A failed submission is logged and the download is
    /// still granted without signing the user in. Returns the downloads
    /// remaining afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a missing field or malformed email,
    /// `QuotaExhausted` once the device has used its free downloads, and
    /// `Storage` if the subscriber or counter cannot be persisted.
    #[instrument(skip(self, form), fields(city = %form.city))]
    pub async fn claim_free_download(&self, form: &LeadForm) -> Result<u32> {
        let form = LeadForm {
            name: form.name.trim().to_owned(),
            email: form.email.trim().to_owned(),
            city: form.city.trim().to_owned(),
        };
        if form.name.is_empty() || form.email.is_empty() || form.city.is_empty() {
            return Err(AppError::Validation(
                "Please fill in all fields to download the bracket.".to_string(),
            ));
        }
        Email::parse(&form.email)?;

        let used = self.downloads_used();
        if used >= MAX_FREE_DOWNLOADS {
            return Err(AppError::QuotaExhausted(format!(
                "You've reached the maximum of {MAX_FREE_DOWNLOADS} free bracket downloads. \
                 Upgrade to Team Info for unlimited access."
            )));
        }

        match self.sink.submit_lead(&form).await {
            Ok(()) => self
                .entitlement
                .set_free_user(&form.email, &form.name, &form.city)?,
            Err(e) => warn!(error = %e, "Lead submission failed, granting download anyway"),
        }

        let used = used + 1;
        self.store
            .set(keys::BRACKET_DOWNLOADS, &used.to_string())?;

        add_breadcrumb("leads", "Free bracket download", None);
        let remaining = MAX_FREE_DOWNLOADS.saturating_sub(used);
        info!(remaining, "Free bracket download granted");
        Ok(remaining)
    }
}
