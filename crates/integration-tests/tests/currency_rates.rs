//! Integration tests for exchange-rate caching and conversion.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use concierge_companion::currency::{Conversion, RatesCache, convert, format_amount};
use concierge_core::{CurrencyCode, ExchangeRateSnapshot};
use concierge_integration_tests::{FakeBackend, rates};

const REFRESH: Duration = Duration::from_secs(4 * 60 * 60);

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::parse(s).unwrap()
}

#[tokio::test]
async fn test_cached_rates_are_reused() {
    let backend = FakeBackend::new();
    backend.push_rates(Ok(rates(&[("USD", 1.0), ("MXN", 17.0)])));
    let cache = RatesCache::new(Arc::clone(&backend), REFRESH);

    let first = cache.rates().await.unwrap();
    let second = cache.rates().await.unwrap();

    assert_eq!(first, second);
    assert!(!second.stale);
    assert_eq!(backend.rates_calls(), 1);
}

#[tokio::test]
async fn test_failed_refresh_serves_stale_table() {
    let backend = FakeBackend::new();
    backend.push_rates(Ok(rates(&[("USD", 1.0), ("EUR", 0.92)])));
    backend.push_rates(Err("upstream down"));
    let cache = RatesCache::new(Arc::clone(&backend), REFRESH);

    cache.rates().await.unwrap();
    let fallback = cache.refresh().await.unwrap();

    assert!(fallback.stale);
    assert_eq!(fallback.rate(&code("EUR")), Some(0.92));
    assert_eq!(backend.rates_calls(), 2);
}

#[tokio::test]
async fn test_first_fetch_failure_is_an_error() {
    let backend = FakeBackend::new();
    backend.push_rates(Err("upstream down"));
    let cache = RatesCache::new(Arc::clone(&backend), REFRESH);

    assert!(cache.rates().await.is_err());
}

#[tokio::test]
async fn test_old_table_is_marked_stale() {
    let backend = FakeBackend::new();
    let mut old = rates(&[("USD", 1.0)]);
    old.last_fetched -= i64::try_from(REFRESH.as_millis()).unwrap() + 1_000;
    backend.push_rates(Ok(old));
    let cache = RatesCache::new(Arc::clone(&backend), REFRESH);

    assert!(cache.rates().await.unwrap().stale);
}

#[tokio::test]
async fn test_background_refresher_keeps_fetching() {
    let backend = FakeBackend::new();
    for mxn in [17.0, 17.5, 18.0] {
        backend.push_rates(Ok(rates(&[("USD", 1.0), ("MXN", mxn)])));
    }
    let cache = RatesCache::new(Arc::clone(&backend), Duration::from_millis(200));

    // Ticks at 0ms and 200ms.
    let refresher = cache.spawn_refresher();
    tokio::time::sleep(Duration::from_millis(300)).await;
    refresher.abort();

    assert_eq!(backend.rates_calls(), 2);
    let latest = cache.rates().await.unwrap();
    assert!(latest.rate(&code("MXN")).is_some_and(|rate| rate >= 17.5));
}

// =============================================================================
// Conversion Tests
// =============================================================================

fn table() -> ExchangeRateSnapshot {
    rates(&[("USD", 1.0), ("MXN", 17.0), ("EUR", 0.5), ("JPY", 150.0)])
}

#[test]
fn test_cross_rate_through_base() {
    let yen = convert(10.0, &code("EUR"), &code("JPY"), &table());
    assert!((yen - 3000.0).abs() < 1e-9);
    assert_eq!(format_amount(yen), "3,000.00");
}

#[test]
fn test_default_form_converts_usd_to_mxn() {
    let conversion = Conversion::default();
    assert_eq!(conversion.display(&table()).unwrap(), "1,700.00");
}

#[test]
fn test_swap_and_invalid_amount() {
    let mut conversion = Conversion::default();
    conversion.swap();
    assert_eq!(conversion.from, code("MXN"));
    assert_eq!(conversion.display(&table()).unwrap(), "5.8824");

    conversion.amount = "abc".to_string();
    assert_eq!(conversion.result(&table()), None);
}

#[test]
fn test_unknown_currency_counts_as_par() {
    let result = convert(100.0, &code("USD"), &code("QAR"), &table());
    assert!((result - 100.0).abs() < f64::EPSILON);
}
