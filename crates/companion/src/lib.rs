//! Championship Concierge companion runtime.
//!
//! This crate provides the client-side runtime as a library: geofenced
//! host-city welcomes, subscription entitlement with its route guard, the
//! currency converter, and the checkout and lead-capture flows.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod currency;
pub mod entitlement;
pub mod error;
pub mod geofence;
pub mod guard;
pub mod notifications;
pub mod services;
pub mod state;
pub mod storage;
