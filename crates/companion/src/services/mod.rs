//! User-facing flows built on the API client and the entitlement store.

pub mod checkout;
pub mod leads;

pub use checkout::CheckoutService;
pub use leads::{LeadCapture, MAX_FREE_DOWNLOADS};
