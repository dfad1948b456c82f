//! Geofenced host-city detection.
//!
//! # Architecture
//!
//! - [`catalog`] holds the static boundaries and welcome copy
//! - [`venues`] holds the stadiums with their gates and ride-share zones
//! - [`platform`] abstracts the device location capability
//! - [`engine`] turns position samples into deduplicated city entries
//! - [`alerts`] builds currency-change and stadium-approach alerts
//! - [`notifier`] delivers the welcome for each entry and every alert

pub mod alerts;
pub mod catalog;
pub mod engine;
pub mod notifier;
pub mod platform;
pub mod venues;

pub use alerts::{LocalCurrency, TravelAlert, TravelAlertKind};
pub use catalog::{CITY_VAULTS, Catalog, CityBoundary, CityVault, Country, HOST_CITY_BOUNDARIES};
pub use engine::{EngineEvent, GeofenceEngine, GeofenceTransition, LocationSessionState};
pub use notifier::{
    InboxNotifier, Notifier, SystemNotification, Toast, WELCOME_TOAST_DURATION, WelcomeNotification,
};
pub use platform::{
    LocationPlatform, PermissionQueryError, PermissionState, Position, PositionError,
    StaticPlatform, WatchEvent, WatchId, WatchOptions,
};
