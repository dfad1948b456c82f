//! Unified error handling with Sentry integration.
//!
//! Provides the `AppError` taxonomy surfaced to the UI layer. Errors never
//! cross the component boundary as crashes: callers turn them into toasts via
//! [`AppError::user_message`], and [`AppError::report`] captures the ones worth
//! investigating to Sentry first.

use concierge_core::EmailError;
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Application-level error type for the companion runtime.
#[derive(Debug, Error)]
pub enum AppError {
    /// The user denied location access.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The platform has no location capability.
    #[error("Location is not supported on this device")]
    PlatformUnsupported,

    /// A backend call failed.
    #[error("Network error: {0}")]
    Network(#[from] ApiError),

    /// Static data references something that does not exist.
    #[error("Data integrity gap: {0}")]
    DataIntegrityGap(String),

    /// User input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Local storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A per-device allowance is used up.
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl AppError {
    /// Message suitable for an inline toast.
    ///
    /// Internal error details are never shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Location access was denied. Enable it in settings to get city alerts.".to_string()
            }
            Self::PlatformUnsupported => {
                "Location services are not available on this device.".to_string()
            }
            Self::Network(_) => "We couldn't reach the server. Please try again.".to_string(),
            Self::Storage(_) | Self::DataIntegrityGap(_) => "Something went wrong.".to_string(),
            Self::Validation(msg) | Self::QuotaExhausted(msg) | Self::NotFound(msg) => msg.clone(),
        }
    }

    /// Whether this error should be captured to Sentry.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Storage(_) | Self::DataIntegrityGap(_))
    }

    /// Capture to Sentry (when reportable) and log.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Companion error"
            );
        } else {
            tracing::debug!(error = %self, "Companion error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a subscriber email.
///
/// Call this after a subscription is established to associate errors with
/// the subscriber.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this when the subscription is cleared.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user-visible state changes.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("geofence", "Entered city", Some(&[("city", "kansasCity")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation("name is required".to_string());
        assert_eq!(err.to_string(), "Validation failed: name is required");

        let err = AppError::DataIntegrityGap("no vault for atlantis".to_string());
        assert_eq!(err.to_string(), "Data integrity gap: no vault for atlantis");
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = AppError::Network(ApiError::Api {
            status: 500,
            message: "stack trace here".to_string(),
        });
        assert!(!err.user_message().contains("stack trace"));

        let err = AppError::Validation("Please fill in all fields.".to_string());
        assert_eq!(err.user_message(), "Please fill in all fields.");
    }

    #[test]
    fn test_reportable_classification() {
        assert!(AppError::DataIntegrityGap("x".to_string()).is_reportable());
        assert!(!AppError::PermissionDenied.is_reportable());
        assert!(!AppError::Validation("x".to_string()).is_reportable());
    }

    #[test]
    fn test_email_error_is_validation() {
        let err: AppError = EmailError::MissingAtSymbol.into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
