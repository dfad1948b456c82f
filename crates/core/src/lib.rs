//! Championship Concierge Core - Shared types library.
//!
//! This crate provides common types used across all Championship Concierge components:
//! - `companion` - Client runtime (geofence engine, entitlements, currency)
//! - `cli` - Command-line driver for the companion runtime
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! persistence, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Email addresses, subscription tiers, coordinates, currencies and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
