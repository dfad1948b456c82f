//! Position stream to city-entry events.
//!
//! The engine owns the receiving end of the platform watch channel. Each call
//! to [`GeofenceEngine::next_event`] takes one event and finishes processing it
//! before the next is taken, so samples are applied strictly in arrival order.
//!
//! Besides city entries, every sample is checked against the stadiums and
//! every city change against the last country, raising [`TravelAlert`]s.

use concierge_core::Coordinates;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::alerts::{TravelAlert, claim_stadium_alert};
use super::catalog::{Catalog, CityBoundary, CityVault, Country};
use super::notifier::{Notifier, WelcomeNotification};
use super::platform::{
    LocationPlatform, PermissionState, Position, PositionError, WatchEvent, WatchId, WatchOptions,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::storage::{KeyValueStore, keys};

/// Observable location session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationSessionState {
    pub is_tracking: bool,
    pub has_permission: bool,
    pub current_city: Option<&'static CityBoundary>,
    /// Key of the city the user is considered inside; equals
    /// `current_city.city_key` whenever a city is set.
    pub previous_city_key: Option<&'static str>,
    pub last_position: Option<Position>,
}

/// A change of city produced by a sample or a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceTransition {
    /// The user arrived in a city. `notified` is false when the city has no
    /// welcome copy.
    Entered {
        city_key: &'static str,
        notified: bool,
    },
    Exited {
        city_key: &'static str,
    },
}

/// Result of processing one watch event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Transition(GeofenceTransition),
    /// A sample that did not change the city.
    Unchanged,
    WatchError(PositionError),
}

/// Geofence engine over a platform, a notifier and local storage.
pub struct GeofenceEngine<P: LocationPlatform, N: Notifier, S: KeyValueStore> {
    platform: P,
    notifier: N,
    store: S,
    catalog: Catalog,
    options: WatchOptions,
    state: LocationSessionState,
    watch: Option<WatchId>,
    events: Option<mpsc::UnboundedReceiver<WatchEvent>>,
}

impl<P: LocationPlatform, N: Notifier, S: KeyValueStore> GeofenceEngine<P, N, S> {
    /// Create an engine over the shipped host-city catalog.
    pub fn new(platform: P, notifier: N, store: S) -> Self {
        Self::with_catalog(platform, notifier, store, Catalog::host_cities())
    }

    /// Create an engine over a custom catalog.
    ///
    /// The last detected city is restored from storage when both its boundary
    /// and its vault exist.
    pub fn with_catalog(platform: P, notifier: N, store: S, catalog: Catalog) -> Self {
        let mut state = LocationSessionState::default();

        match store.get(keys::LAST_DETECTED_CITY) {
            Ok(Some(key)) => {
                if let (Some(city), Some(_)) = (catalog.boundary(&key), catalog.vault(&key)) {
                    debug!(city = city.city_key, "Restored last detected city");
                    state.current_city = Some(city);
                    state.previous_city_key = Some(city.city_key);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read last detected city"),
        }

        Self {
            platform,
            notifier,
            store,
            catalog,
            options: WatchOptions::BATTERY_SAVER,
            state,
            watch: None,
            events: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &LocationSessionState {
        &self.state
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// Welcome copy for the current city.
    #[must_use]
    pub fn current_vault(&self) -> Option<&'static CityVault> {
        self.state
            .current_city
            .and_then(|city| self.catalog.vault(city.city_key))
    }

    /// Ask for location access.
    ///
    /// A `Prompt` state is resolved by requesting one fix, which is what shows
    /// the platform dialog. If the permission query itself fails the same
    /// single request is used.
    #[instrument(skip(self))]
    pub async fn request_permission(&mut self) -> bool {
        if !self.platform.is_supported() {
            self.notifier.location_unsupported();
            return false;
        }

        let granted = match self.platform.permission_state().await {
            Ok(PermissionState::Granted) => true,
            Ok(PermissionState::Prompt) => self.request_fix().await,
            Ok(PermissionState::Denied) => {
                debug!("Location permission denied");
                false
            }
            Err(e) => {
                debug!(error = %e, "Permission query failed, requesting a fix instead");
                self.request_fix().await
            }
        };

        self.state.has_permission = granted;
        granted
    }

    /// [`request_permission`](Self::request_permission) for callers that
    /// need a reason on refusal.
    ///
    /// # Errors
    ///
    /// Returns `PlatformUnsupported` when the device has no location
    /// capability and `PermissionDenied` when access was refused.
    pub async fn ensure_permission(&mut self) -> Result<()> {
        if self.request_permission().await {
            Ok(())
        } else if self.platform.is_supported() {
            Err(AppError::PermissionDenied)
        } else {
            Err(AppError::PlatformUnsupported)
        }
    }

    async fn request_fix(&self) -> bool {
        match self.platform.current_position(self.options).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Position request refused");
                false
            }
        }
    }

    /// Begin watching position, replacing any existing watch.
    pub fn start_tracking(&mut self) {
        if !self.platform.is_supported() {
            return;
        }

        self.cancel_watch();

        let (tx, rx) = mpsc::unbounded_channel();
        self.watch = Some(self.platform.watch_position(self.options, tx));
        self.events = Some(rx);
        self.state.is_tracking = true;

        self.persist(keys::LOCATION_TRACKING_ENABLED, "true");
        info!("Location tracking started");
    }

    /// Stop watching position. Safe to call when not tracking.
    pub fn stop_tracking(&mut self) {
        self.cancel_watch();
        self.state.is_tracking = false;
        self.persist(keys::LOCATION_TRACKING_ENABLED, "false");
        debug!("Location tracking stopped");
    }

    /// Resume tracking at launch if the user left it enabled.
    ///
    /// Returns whether tracking is now active.
    pub async fn resume(&mut self) -> bool {
        let enabled = matches!(
            self.store.get(keys::LOCATION_TRACKING_ENABLED),
            Ok(Some(ref value)) if value == "true"
        );
        if !enabled {
            return false;
        }

        if self.request_permission().await {
            self.start_tracking();
            true
        } else {
            false
        }
    }

    /// Enter `city_key` as if a sample had placed the user there.
    ///
    /// Returns false without changing anything unless the city has both a
    /// boundary and a vault.
    pub fn simulate_city(&mut self, city_key: &str) -> bool {
        let (Some(city), Some(vault)) =
            (self.catalog.boundary(city_key), self.catalog.vault(city_key))
        else {
            warn!(city = city_key, "Cannot simulate unknown city");
            return false;
        };

        self.set_current_city(city);
        self.notifier
            .welcome(&WelcomeNotification::for_city(city, vault));
        true
    }

    /// Wait for the next watch event and apply it.
    ///
    /// Returns `None` when not tracking or when the platform closed the watch.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        let event = self.events.as_mut()?.recv().await;

        let Some(event) = event else {
            debug!("Position watch closed by platform");
            self.events = None;
            self.watch = None;
            self.state.is_tracking = false;
            return None;
        };

        Some(match event {
            WatchEvent::Position(position) => self
                .handle_position_update(position)
                .map_or(EngineEvent::Unchanged, EngineEvent::Transition),
            WatchEvent::Error(error) => {
                self.handle_watch_error(&error);
                EngineEvent::WatchError(error)
            }
        })
    }

    /// Apply one position sample.
    pub fn handle_position_update(&mut self, position: Position) -> Option<GeofenceTransition> {
        self.state.last_position = Some(position);
        self.check_stadium(position.coordinates());

        match self
            .catalog
            .check_city_perimeter(position.latitude, position.longitude)
        {
            Some(city) if self.state.previous_city_key != Some(city.city_key) => {
                Some(self.enter(city))
            }
            Some(_) => None,
            None => {
                let city_key = self.state.previous_city_key.take()?;
                self.state.current_city = None;
                info!(city = city_key, "Left host city");
                add_breadcrumb("geofence", "Left city", Some(&[("city", city_key)]));
                Some(GeofenceTransition::Exited { city_key })
            }
        }
    }

    fn enter(&mut self, city: &'static CityBoundary) -> GeofenceTransition {
        self.set_current_city(city);
        info!(city = city.city_key, "Entered host city");
        add_breadcrumb("geofence", "Entered city", Some(&[("city", city.city_key)]));

        let notified = if let Some(vault) = self.catalog.vault(city.city_key) {
            self.notifier
                .welcome(&WelcomeNotification::for_city(city, vault));
            true
        } else {
            AppError::DataIntegrityGap(format!("no vault for city {}", city.city_key)).report();
            false
        };

        GeofenceTransition::Entered {
            city_key: city.city_key,
            notified,
        }
    }

    fn set_current_city(&mut self, city: &'static CityBoundary) {
        self.state.current_city = Some(city);
        self.state.previous_city_key = Some(city.city_key);
        self.persist(keys::LAST_DETECTED_CITY, city.city_key);
        self.check_currency_change(city.country);
    }

    /// Alert when `country` differs from the country of the last city
    /// entered. The first city ever entered only records its country.
    fn check_currency_change(&self, country: Country) {
        let last = match self.store.get(keys::LAST_DETECTED_COUNTRY) {
            Ok(code) => code.as_deref().and_then(Country::from_code),
            Err(e) => {
                warn!(error = %e, "Failed to read last detected country");
                None
            }
        };

        if let Some(from) = last
            && let Some(alert) = TravelAlert::currency_change(from, country)
        {
            info!(from = from.code(), to = country.code(), "Crossed into a new currency");
            self.notifier.travel_alert(&alert);
        }
        self.persist(keys::LAST_DETECTED_COUNTRY, country.code());
    }

    /// Alert the first time each day a sample lands near a stadium.
    fn check_stadium(&self, point: Coordinates) {
        let Some(stadium) = self.catalog.nearby_stadium(point) else {
            return;
        };

        let today = chrono::Local::now().date_naive();
        if claim_stadium_alert(&self.store, stadium, today) {
            info!(stadium = stadium.name, "Approaching stadium");
            add_breadcrumb("geofence", "Approaching stadium", Some(&[("stadium", stadium.name)]));
            self.notifier
                .travel_alert(&TravelAlert::stadium_approach(stadium, point));
        }
    }

    fn handle_watch_error(&mut self, error: &PositionError) {
        if *error == PositionError::PermissionDenied {
            warn!("Location permission revoked while tracking");
            self.state.has_permission = false;
        } else {
            warn!(error = %error, "Position watch error");
        }
    }

    fn cancel_watch(&mut self) {
        if let Some(id) = self.watch.take() {
            self.platform.clear_watch(id);
        }
        self.events = None;
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            AppError::from(e).report();
        }
    }
}

impl<P: LocationPlatform, N: Notifier, S: KeyValueStore> Drop for GeofenceEngine<P, N, S> {
    fn drop(&mut self) {
        if let Some(id) = self.watch.take() {
            self.platform.clear_watch(id);
        }
    }
}
