//! `reqwest` implementation of the backend API.

use std::sync::Arc;

use concierge_core::{Email, ExchangeRateSnapshot};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    CheckoutRequest, CheckoutSession, CheckoutVerification, ErrorBody, Lead, LeadForm,
    VerifyResponse,
};
use super::{ApiError, CheckoutGateway, LeadSink, RatesSource, SubscriptionVerifier};
use crate::config::CompanionConfig;

/// Client for the Championship Concierge backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CompanionConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// Backend origin this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// List captured leads.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_leads(&self) -> Result<Vec<Lead>, ApiError> {
        let url = self.endpoint("/api/leads")?;
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }

    /// Download all leads as CSV.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn export_leads_csv(&self) -> Result<String, ApiError> {
        let url = self.endpoint("/api/admin/leads/export")?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

impl SubscriptionVerifier for ApiClient {
    #[instrument(skip(self), fields(email = %email))]
    async fn verify_subscription(&self, email: &Email) -> Result<VerifyResponse, ApiError> {
        let url = self.endpoint(&format!(
            "/api/subscription/verify?email={}",
            urlencoding::encode(email.as_str())
        ))?;

        let response = self.inner.client.get(url).send().await?;
        let verified: VerifyResponse = read_json(response).await?;
        debug!(valid = verified.valid, tier = ?verified.tier, "Subscription verification answered");
        Ok(verified)
    }
}

impl RatesSource for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_rates(&self) -> Result<ExchangeRateSnapshot, ApiError> {
        let url = self.endpoint("/api/currency/rates")?;
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }
}

impl CheckoutGateway for ApiClient {
    #[instrument(skip(self))]
    async fn create_checkout_session(&self, price_id: &str) -> Result<CheckoutSession, ApiError> {
        let url = self.endpoint("/api/checkout")?;
        let response = self
            .inner
            .client
            .post(url)
            .json(&CheckoutRequest { price_id })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Prefer the backend's explanation over the bare status line
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.details.or(body.error))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            ApiError::Parse(format!(
                "{e}: {}",
                text.chars().take(200).collect::<String>()
            ))
        })
    }

    #[instrument(skip(self))]
    async fn verify_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutVerification, ApiError> {
        let url = self.endpoint(&format!(
            "/api/checkout/verify?session_id={}",
            urlencoding::encode(session_id)
        ))?;
        let response = self.inner.client.get(url).send().await?;
        read_json(response).await
    }
}

impl LeadSink for ApiClient {
    #[instrument(skip(self, lead), fields(city = %lead.city))]
    async fn submit_lead(&self, lead: &LeadForm) -> Result<(), ApiError> {
        let url = self.endpoint("/api/leads")?;
        let response = self.inner.client.post(url).json(lead).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Check the status and decode a JSON body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        tracing::warn!(
            status = %status,
            body = %message.chars().take(200).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}
