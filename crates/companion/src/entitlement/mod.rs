//! Subscription entitlement.
//!
//! [`EntitlementStore`] is the single source of truth for the subscriber's
//! tier. It is seeded from local storage, confirmed against the backend, and
//! falls back according to [`offline_fallback_allows`] when the backend says
//! no or cannot be reached.

mod policy;
mod store;

pub use policy::offline_fallback_allows;
pub use store::{EntitlementPhase, EntitlementSnapshot, EntitlementStore};
