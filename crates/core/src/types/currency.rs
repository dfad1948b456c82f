//! Currency codes, exchange-rate snapshots and plan prices.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyCodeError {
    #[error("currency code must be exactly 3 letters, got {0:?}")]
    InvalidLength(String),
    #[error("currency code must be alphabetic, got {0:?}")]
    NotAlphabetic(String),
}

/// ISO 4217 alphabetic currency code, stored uppercase.
///
/// ```
/// use concierge_core::CurrencyCode;
///
/// let mxn = CurrencyCode::parse("mxn").unwrap();
/// assert_eq!(mxn.as_str(), "MXN");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code, accepting any letter case.
    ///
    /// # Errors
    ///
    /// Returns an error unless the trimmed input is three ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyCodeError> {
        let trimmed = s.trim();
        if trimmed.len() != 3 {
            return Err(CurrencyCodeError::InvalidLength(s.to_owned()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyCodeError::NotAlphabetic(s.to_owned()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The base currency all rates are quoted against.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// A table of exchange rates relative to a single base currency.
///
/// Serialized in the camelCase shape served by `GET /api/currency/rates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateSnapshot {
    /// Base currency; every rate is "units of code per one base unit".
    pub base: String,
    /// Date the upstream provider published the rates.
    pub date: String,
    /// Rate per currency code.
    pub rates: HashMap<String, f64>,
    /// Unix milliseconds when the rates were fetched.
    pub last_fetched: i64,
    /// Set when the snapshot is older than the refresh interval or could not
    /// be refreshed.
    #[serde(default)]
    pub stale: bool,
}

impl ExchangeRateSnapshot {
    /// Rate for `code`, if present in the table.
    #[must_use]
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code.as_str()).copied()
    }

    /// Age of the snapshot at `now_ms`, clamped at zero.
    #[must_use]
    pub const fn age_ms(&self, now_ms: i64) -> i64 {
        let age = now_ms.saturating_sub(self.last_fetched);
        if age < 0 { 0 } else { age }
    }

    /// Whether the snapshot is older than `max_age_ms` at `now_ms`.
    #[must_use]
    pub const fn is_older_than(&self, max_age_ms: i64, now_ms: i64) -> bool {
        self.age_ms(now_ms) > max_age_ms
    }

    /// Fetch time as a UTC timestamp.
    #[must_use]
    pub fn fetched_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.last_fetched)
    }
}

/// A USD price for a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in dollars, not cents.
    pub amount: Decimal,
}

impl Price {
    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self {
            amount: Decimal::new(cents, 2),
        }
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display (e.g., "$4.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(last_fetched: i64) -> ExchangeRateSnapshot {
        ExchangeRateSnapshot {
            base: "USD".to_owned(),
            date: "2026-06-11".to_owned(),
            rates: HashMap::from([("USD".to_owned(), 1.0), ("MXN".to_owned(), 17.0)]),
            last_fetched,
            stale: false,
        }
    }

    #[test]
    fn test_currency_code_uppercases() {
        assert_eq!(CurrencyCode::parse(" eur ").unwrap().as_str(), "EUR");
    }

    #[test]
    fn test_currency_code_rejects_bad_input() {
        assert!(matches!(
            CurrencyCode::parse("EURO"),
            Err(CurrencyCodeError::InvalidLength(_))
        ));
        assert!(matches!(
            CurrencyCode::parse("U$D"),
            Err(CurrencyCodeError::NotAlphabetic(_))
        ));
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let json = r#"{"base":"USD","date":"2026-06-11","rates":{"MXN":17.0},"lastFetched":1000}"#;
        let parsed: ExchangeRateSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.last_fetched, 1000);
        assert!(!parsed.stale);
        assert_eq!(parsed.rate(&CurrencyCode::parse("MXN").unwrap()), Some(17.0));
        assert_eq!(parsed.rate(&CurrencyCode::parse("JPY").unwrap()), None);
    }

    #[test]
    fn test_snapshot_age() {
        let snap = snapshot(10_000);
        assert_eq!(snap.age_ms(15_000), 5_000);
        assert_eq!(snap.age_ms(5_000), 0);
        assert!(snap.is_older_than(4_000, 15_000));
        assert!(!snap.is_older_than(5_000, 15_000));
    }

    #[test]
    fn test_snapshot_age_saturates_on_extreme_timestamps() {
        let json = r#"{"base":"USD","date":"2026-06-11","rates":{},"lastFetched":-9223372036854775808}"#;
        let ancient: ExchangeRateSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(ancient.age_ms(1_750_000_000_000), i64::MAX);
        assert!(ancient.is_older_than(14_400_000, 1_750_000_000_000));

        let future = snapshot(i64::MAX);
        assert_eq!(future.age_ms(i64::MIN), 0);
        assert!(!future.is_older_than(0, 1_750_000_000_000));
    }

    #[test]
    fn test_fetched_at() {
        let at = snapshot(1_781_136_000_000).fetched_at().unwrap();
        assert_eq!(at.format("%Y-%m-%d %H:%M").to_string(), "2026-06-11 00:00");
        assert!(snapshot(i64::MIN).fetched_at().is_none());
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_cents(499).display(), "$4.99");
        assert_eq!(Price::from_cents(2499).display(), "$24.99");
        assert!(Price::from_cents(0).is_free());
    }
}
