//! Core types for Championship Concierge.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod currency;
pub mod email;
pub mod geo;
pub mod tier;

pub use currency::{CurrencyCode, CurrencyCodeError, ExchangeRateSnapshot, Price};
pub use email::{Email, EmailError};
pub use geo::{Coordinates, EARTH_RADIUS_KM, haversine_km};
pub use tier::{SubscriptionTier, TierParseError};
