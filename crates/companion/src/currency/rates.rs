//! Read-through cache of exchange-rate tables.
//!
//! Rates are cached with `moka` for the configured refresh interval. When a
//! refetch fails the last good table is served with `stale` set, so the
//! converter never blocks on the network.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use concierge_core::ExchangeRateSnapshot;
use moka::future::Cache;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, RatesSource};

const RATES_KEY: &str = "/api/currency/rates";

/// Exchange-rate cache over a [`RatesSource`].
///
/// Cheap to clone; clones share one cache.
pub struct RatesCache<R> {
    inner: Arc<RatesCacheInner<R>>,
}

struct RatesCacheInner<R> {
    source: R,
    cache: Cache<&'static str, ExchangeRateSnapshot>,
    last_good: RwLock<Option<ExchangeRateSnapshot>>,
    refresh: Duration,
}

impl<R> Clone for RatesCache<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> std::fmt::Debug for RatesCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatesCache")
            .field("refresh", &self.inner.refresh)
            .finish_non_exhaustive()
    }
}

impl<R: RatesSource> RatesCache<R> {
    /// Create a cache that refetches after `refresh`.
    pub fn new(source: R, refresh: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(refresh)
            .build();

        Self {
            inner: Arc::new(RatesCacheInner {
                source,
                cache,
                last_good: RwLock::new(None),
                refresh,
            }),
        }
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.inner.refresh
    }

    /// Current rate table.
    ///
    /// # Errors
    ///
    /// Returns an error only when the fetch fails and no table has ever been
    /// fetched.
    #[instrument(skip(self))]
    pub async fn rates(&self) -> Result<ExchangeRateSnapshot, ApiError> {
        if let Some(snapshot) = self.inner.cache.get(RATES_KEY).await {
            debug!("Rates cache hit");
            return Ok(self.mark_age(snapshot));
        }

        self.fetch().await
    }

    /// Drop the cached table and fetch a new one.
    ///
    /// # Errors
    ///
    /// See [`rates`](Self::rates).
    pub async fn refresh(&self) -> Result<ExchangeRateSnapshot, ApiError> {
        self.inner.cache.invalidate(RATES_KEY).await;
        self.fetch().await
    }

    async fn fetch(&self) -> Result<ExchangeRateSnapshot, ApiError> {
        match self.inner.source.fetch_rates().await {
            Ok(snapshot) => {
                debug!(date = %snapshot.date, currencies = snapshot.rates.len(), "Fetched rates");
                self.inner.cache.insert(RATES_KEY, snapshot.clone()).await;
                if let Ok(mut last) = self.inner.last_good.write() {
                    *last = Some(snapshot.clone());
                }
                Ok(self.mark_age(snapshot))
            }
            Err(e) => {
                let fallback = self
                    .inner
                    .last_good
                    .read()
                    .ok()
                    .and_then(|last| last.clone());

                match fallback {
                    Some(mut snapshot) => {
                        warn!(error = %e, "Rate refresh failed, serving last good table");
                        snapshot.stale = true;
                        Ok(snapshot)
                    }
                    None => Err(e),
                }
            }
        }
    }

    fn mark_age(&self, mut snapshot: ExchangeRateSnapshot) -> ExchangeRateSnapshot {
        let max_age = i64::try_from(self.inner.refresh.as_millis()).unwrap_or(i64::MAX);
        if snapshot.is_older_than(max_age, chrono::Utc::now().timestamp_millis()) {
            snapshot.stale = true;
        }
        snapshot
    }
}

impl<R: RatesSource + 'static> RatesCache<R> {
    /// Spawn a task that refreshes the table every refresh interval.
    ///
    /// The first refresh runs immediately. Abort the handle to stop it.
    pub fn spawn_refresher(&self) -> JoinHandle<()> {
        let rates = self.clone();
        info!(interval_secs = rates.inner.refresh.as_secs(), "Spawning rates refresher");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(rates.inner.refresh);
            loop {
                ticker.tick().await;
                match rates.refresh().await {
                    Ok(snapshot) if snapshot.stale => debug!("Refresher kept stale rates"),
                    Ok(_) => debug!("Refresher updated rates"),
                    Err(e) => warn!(error = %e, "Refresher could not fetch rates"),
                }
            }
        })
    }
}
