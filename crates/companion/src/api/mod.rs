//! Backend HTTP API.
//!
//! # Architecture
//!
//! - [`ApiClient`] talks to the backend over `reqwest` 0.13 with JSON bodies
//! - Each remote collaborator is a trait so services can be exercised with
//!   in-process fakes: [`SubscriptionVerifier`], [`RatesSource`],
//!   [`CheckoutGateway`] and [`LeadSink`]
//! - The payment provider itself is never called directly; the backend
//!   creates and verifies checkout sessions
//!
//! # Endpoints
//!
//! | method | path | response |
//! |---|---|---|
//! | GET | `/api/subscription/verify?email=` | [`VerifyResponse`] |
//! | POST | `/api/checkout` | [`CheckoutSession`] |
//! | GET | `/api/checkout/verify?session_id=` | [`CheckoutVerification`] |
//! | GET | `/api/currency/rates` | `ExchangeRateSnapshot` |
//! | GET/POST | `/api/leads` | [`Lead`] list / accepted |
//! | GET | `/api/admin/leads/export` | CSV text |

mod client;
pub mod types;

use std::future::Future;

use concierge_core::{Email, ExchangeRateSnapshot};
use thiserror::Error;

pub use client::ApiClient;
pub use types::*;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Remote authority for subscription validity.
pub trait SubscriptionVerifier: Send + Sync {
    /// Ask the backend whether `email` holds an active subscription.
    fn verify_subscription(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<VerifyResponse, ApiError>> + Send;
}

/// Source of exchange-rate tables.
pub trait RatesSource: Send + Sync {
    /// Fetch the current rate table.
    fn fetch_rates(&self) -> impl Future<Output = Result<ExchangeRateSnapshot, ApiError>> + Send;
}

/// Backend endpoints wrapping the payment provider's hosted checkout.
pub trait CheckoutGateway: Send + Sync {
    /// Create a hosted checkout session for `price_id`.
    fn create_checkout_session(
        &self,
        price_id: &str,
    ) -> impl Future<Output = Result<CheckoutSession, ApiError>> + Send;

    /// Look up the outcome of a completed checkout session.
    fn verify_checkout_session(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<CheckoutVerification, ApiError>> + Send;
}

/// Destination for free-tier lead capture.
pub trait LeadSink: Send + Sync {
    /// Record a lead.
    fn submit_lead(&self, lead: &LeadForm) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl<T: SubscriptionVerifier + ?Sized> SubscriptionVerifier for std::sync::Arc<T> {
    fn verify_subscription(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<VerifyResponse, ApiError>> + Send {
        (**self).verify_subscription(email)
    }
}

impl<T: RatesSource + ?Sized> RatesSource for std::sync::Arc<T> {
    fn fetch_rates(&self) -> impl Future<Output = Result<ExchangeRateSnapshot, ApiError>> + Send {
        (**self).fetch_rates()
    }
}

impl<T: LeadSink + ?Sized> LeadSink for std::sync::Arc<T> {
    fn submit_lead(&self, lead: &LeadForm) -> impl Future<Output = Result<(), ApiError>> + Send {
        (**self).submit_lead(lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Api {
            status: 400,
            message: "missing priceId".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 400 - missing priceId");
    }
}
