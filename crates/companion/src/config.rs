//! Companion configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CONCIERGE_API_BASE_URL` - Origin of the backend serving `/api/*`
//!
//! ## Optional
//! - `CONCIERGE_STORAGE_PATH` - Local storage file (default: .concierge/storage.json)
//! - `CONCIERGE_HTTP_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `CONCIERGE_RATES_REFRESH_SECS` - Exchange-rate refresh interval (default: 14400)
//! - `CONCIERGE_PRICE_TEAM_INFO` - Payment-provider price id for the team info plan
//! - `CONCIERGE_PRICE_LOGISTICS` - Payment-provider price id for the logistics plan
//! - `CONCIERGE_PRICE_AI_CONCIERGE` - Payment-provider price id for the AI concierge plan
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use concierge_core::{Price, SubscriptionTier};
use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_PATH: &str = ".concierge/storage.json";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";
/// Four hours, both the cache lifetime and the refetch interval.
const DEFAULT_RATES_REFRESH_SECS: &str = "14400";

const DEFAULT_PRICE_TEAM_INFO: &str = "price_1SoSQYKAEwbrdBYlW0kPI4ww";
const DEFAULT_PRICE_LOGISTICS: &str = "price_1SoSSoKAEwbrdBYlphO1lVDx";
const DEFAULT_PRICE_AI_CONCIERGE: &str = "price_1SoSU6KAEwbrdBYloERNzAzQ";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Companion runtime configuration.
#[derive(Debug, Clone)]
pub struct CompanionConfig {
    /// Backend origin; API paths are joined onto it
    pub api_base_url: Url,
    /// File backing the local key/value storage
    pub storage_path: PathBuf,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// Exchange-rate cache lifetime and background refetch interval
    pub rates_refresh: Duration,
    /// Subscription plans offered at checkout
    pub plans: PlanCatalog,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// A purchasable (or free) subscription plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPlan {
    pub tier: SubscriptionTier,
    pub price: Price,
    /// Payment-provider price id; `None` for the free plan.
    pub price_id: Option<String>,
}

/// The four plans shown on the pricing screen, cheapest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCatalog {
    plans: Vec<PricingPlan>,
}

impl PlanCatalog {
    /// Build the catalog with the given provider price ids for the paid tiers.
    #[must_use]
    pub fn new(team_info: String, logistics: String, ai_concierge: String) -> Self {
        Self {
            plans: vec![
                PricingPlan {
                    tier: SubscriptionTier::Free,
                    price: Price::from_cents(0),
                    price_id: None,
                },
                PricingPlan {
                    tier: SubscriptionTier::TeamInfo,
                    price: Price::from_cents(499),
                    price_id: Some(team_info),
                },
                PricingPlan {
                    tier: SubscriptionTier::Logistics,
                    price: Price::from_cents(1499),
                    price_id: Some(logistics),
                },
                PricingPlan {
                    tier: SubscriptionTier::AiConcierge,
                    price: Price::from_cents(2499),
                    price_id: Some(ai_concierge),
                },
            ],
        }
    }

    /// Plan for `tier`, if one is offered.
    #[must_use]
    pub fn plan(&self, tier: SubscriptionTier) -> Option<&PricingPlan> {
        self.plans.iter().find(|plan| plan.tier == tier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricingPlan> {
        self.plans.iter()
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRICE_TEAM_INFO.to_owned(),
            DEFAULT_PRICE_LOGISTICS.to_owned(),
            DEFAULT_PRICE_AI_CONCIERGE.to_owned(),
        )
    }
}

impl CompanionConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_required_env("CONCIERGE_API_BASE_URL")?)?;
        let storage_path =
            PathBuf::from(get_env_or_default("CONCIERGE_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let http_timeout = get_duration_secs("CONCIERGE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let rates_refresh =
            get_duration_secs("CONCIERGE_RATES_REFRESH_SECS", DEFAULT_RATES_REFRESH_SECS)?;

        let plans = PlanCatalog::new(
            get_env_or_default("CONCIERGE_PRICE_TEAM_INFO", DEFAULT_PRICE_TEAM_INFO),
            get_env_or_default("CONCIERGE_PRICE_LOGISTICS", DEFAULT_PRICE_LOGISTICS),
            get_env_or_default("CONCIERGE_PRICE_AI_CONCIERGE", DEFAULT_PRICE_AI_CONCIERGE),
        );

        Ok(Self {
            api_base_url,
            storage_path,
            http_timeout,
            rates_refresh,
            plans,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_base_url` with every optional setting at
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn with_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            http_timeout: Duration::from_secs(30),
            rates_refresh: Duration::from_secs(14_400),
            plans: PlanCatalog::default(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a positive number of seconds.
fn get_duration_secs(key: &str, default: &str) -> Result<Duration, ConfigError> {
    let raw = get_env_or_default(key, default);
    parse_positive_secs(&raw).map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason))
}

fn parse_positive_secs(raw: &str) -> Result<Duration, String> {
    let secs = raw.trim().parse::<u64>().map_err(|e| e.to_string())?;
    if secs == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}

/// Parse the API origin, requiring http(s).
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("CONCIERGE_API_BASE_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "CONCIERGE_API_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}
