//! Integration tests for Championship Concierge.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p concierge-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `geofence_engine` - Position samples through to welcomes in the inbox
//! - `entitlement_store` - Boot reconciliation, fallback and single-flight verify
//! - `route_guard` - Guard decisions following the entitlement store
//! - `currency_rates` - Rate caching, stale fallback and conversion
//! - `checkout_and_leads` - Purchase, restore and free downloads
//!
//! No network is used: the backend is replaced by the in-process fakes in
//! this crate, and storage is a [`MemoryStore`] or a temporary file.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use concierge_companion::api::{
    ApiError, CheckoutGateway, CheckoutSession, CheckoutVerification, LeadForm, LeadSink,
    RatesSource, SubscriptionVerifier, VerifyResponse,
};
use concierge_companion::geofence::{Notifier, TravelAlert, WelcomeNotification};
use concierge_companion::storage::{MemoryStore, keys};
use concierge_core::{Email, ExchangeRateSnapshot};

// =============================================================================
// Backend
// =============================================================================

/// Scripted stand-in for the backend.
///
/// Verification answers come from a per-email table; a missing entry means
/// the backend is unreachable.
#[derive(Debug, Default)]
pub struct FakeBackend {
    subscriptions: Mutex<HashMap<String, VerifyResponse>>,
    rates: Mutex<VecDeque<Result<ExchangeRateSnapshot, String>>>,
    checkout: Mutex<HashMap<String, CheckoutVerification>>,
    leads: Mutex<Vec<LeadForm>>,
    reject_leads: Mutex<bool>,
    verify_delay: Mutex<Option<Duration>>,
    verify_calls: AtomicUsize,
    rates_calls: AtomicUsize,
    checkout_sessions: Mutex<Vec<String>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer verification for `email` with `tier` (valid) or `None` (invalid).
    pub fn set_subscription(&self, email: &str, tier: Option<&str>) {
        self.subscriptions.lock().unwrap().insert(
            email.to_owned(),
            VerifyResponse {
                valid: tier.is_some(),
                tier: tier.map(str::to_owned),
            },
        );
    }

    /// Make verification for `email` fail as if the network were down.
    pub fn go_offline(&self, email: &str) {
        self.subscriptions.lock().unwrap().remove(email);
    }

    /// Hold every verification for `delay` before answering.
    pub fn slow_verify(&self, delay: Duration) {
        *self.verify_delay.lock().unwrap() = Some(delay);
    }

    #[must_use]
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn push_rates(&self, rates: Result<ExchangeRateSnapshot, &str>) {
        self.rates
            .lock()
            .unwrap()
            .push_back(rates.map_err(str::to_owned));
    }

    #[must_use]
    pub fn rates_calls(&self) -> usize {
        self.rates_calls.load(Ordering::SeqCst)
    }

    /// Script the outcome of checkout session `session_id`.
    pub fn finish_checkout(&self, session_id: &str, email: Option<&str>, tier: Option<&str>) {
        self.checkout.lock().unwrap().insert(
            session_id.to_owned(),
            CheckoutVerification {
                success: email.is_some() && tier.is_some(),
                email: email.map(str::to_owned),
                tier: tier.map(str::to_owned),
            },
        );
    }

    /// Price ids checkout sessions were created for.
    #[must_use]
    pub fn checkout_sessions(&self) -> Vec<String> {
        self.checkout_sessions.lock().unwrap().clone()
    }

    pub fn reject_leads(&self) {
        *self.reject_leads.lock().unwrap() = true;
    }

    #[must_use]
    pub fn leads(&self) -> Vec<LeadForm> {
        self.leads.lock().unwrap().clone()
    }
}

fn unavailable(message: &str) -> ApiError {
    ApiError::Api {
        status: 503,
        message: message.to_owned(),
    }
}

impl SubscriptionVerifier for FakeBackend {
    async fn verify_subscription(&self, email: &Email) -> Result<VerifyResponse, ApiError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.verify_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.subscriptions
            .lock()
            .unwrap()
            .get(email.as_str())
            .cloned()
            .ok_or_else(|| unavailable("verification offline"))
    }
}

impl RatesSource for FakeBackend {
    async fn fetch_rates(&self) -> Result<ExchangeRateSnapshot, ApiError> {
        self.rates_calls.fetch_add(1, Ordering::SeqCst);
        match self.rates.lock().unwrap().pop_front() {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(message)) => Err(unavailable(&message)),
            None => Err(unavailable("no rates scripted")),
        }
    }
}

impl CheckoutGateway for FakeBackend {
    async fn create_checkout_session(&self, price_id: &str) -> Result<CheckoutSession, ApiError> {
        self.checkout_sessions
            .lock()
            .unwrap()
            .push(price_id.to_owned());
        Ok(CheckoutSession {
            url: format!("https://checkout.example.com/pay/{price_id}"),
        })
    }

    async fn verify_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutVerification, ApiError> {
        self.checkout
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: "No such checkout session".to_owned(),
            })
    }
}

impl LeadSink for FakeBackend {
    async fn submit_lead(&self, lead: &LeadForm) -> Result<(), ApiError> {
        if *self.reject_leads.lock().unwrap() {
            return Err(unavailable("leads offline"));
        }
        self.leads.lock().unwrap().push(lead.clone());
        Ok(())
    }
}

/// Forwards to a shared [`FakeBackend`] so one fake can serve every role.
///
/// `Arc<FakeBackend>` already implements the verifier and rates traits; this
/// wrapper covers checkout and leads as well.
#[derive(Debug, Clone)]
pub struct Backend(pub Arc<FakeBackend>);

impl SubscriptionVerifier for Backend {
    async fn verify_subscription(&self, email: &Email) -> Result<VerifyResponse, ApiError> {
        self.0.verify_subscription(email).await
    }
}

impl CheckoutGateway for Backend {
    async fn create_checkout_session(&self, price_id: &str) -> Result<CheckoutSession, ApiError> {
        self.0.create_checkout_session(price_id).await
    }

    async fn verify_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutVerification, ApiError> {
        self.0.verify_checkout_session(session_id).await
    }
}

impl LeadSink for Backend {
    async fn submit_lead(&self, lead: &LeadForm) -> Result<(), ApiError> {
        self.0.submit_lead(lead).await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A fresh rate table fetched now.
#[must_use]
pub fn rates(pairs: &[(&str, f64)]) -> ExchangeRateSnapshot {
    ExchangeRateSnapshot {
        base: "USD".to_owned(),
        date: "2026-06-11".to_owned(),
        rates: pairs
            .iter()
            .map(|(code, rate)| ((*code).to_owned(), *rate))
            .collect(),
        last_fetched: chrono::Utc::now().timestamp_millis(),
        stale: false,
    }
}

/// A store holding a previously saved subscription.
#[must_use]
pub fn stored_subscription(email: &str, tier: &str) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_entries([
        (keys::SUBSCRIPTION_EMAIL, email),
        (keys::SUBSCRIPTION_TIER, tier),
        (keys::SUBSCRIPTION_NAME, "Sam"),
        (keys::SUBSCRIPTION_CITY, "Seattle"),
    ]))
}

// =============================================================================
// Notifier
// =============================================================================

/// Notifier that records what it was asked to deliver.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    welcomes: Mutex<Vec<WelcomeNotification>>,
    alerts: Mutex<Vec<TravelAlert>>,
    unsupported: AtomicUsize,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// City keys welcomed so far, in order.
    #[must_use]
    pub fn welcomed(&self) -> Vec<String> {
        self.welcomes
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.city_key.clone())
            .collect()
    }

    #[must_use]
    pub fn last_welcome(&self) -> Option<WelcomeNotification> {
        self.welcomes.lock().unwrap().last().cloned()
    }

    /// Travel alert titles so far, in order.
    #[must_use]
    pub fn alert_titles(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.title.clone())
            .collect()
    }

    #[must_use]
    pub fn unsupported_count(&self) -> usize {
        self.unsupported.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn welcome(&self, notification: &WelcomeNotification) {
        self.welcomes.lock().unwrap().push(notification.clone());
    }

    fn travel_alert(&self, alert: &TravelAlert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }

    fn location_unsupported(&self) {
        self.unsupported.fetch_add(1, Ordering::SeqCst);
    }
}
