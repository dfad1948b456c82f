//! Notifications raised by the geofence engine.
//!
//! The engine never talks to a toast system or the OS directly; it hands a
//! [`WelcomeNotification`] or a [`TravelAlert`] to a [`Notifier`].

use std::time::Duration;

use tracing::{info, warn};

use super::alerts::{TravelAlert, TravelAlertKind};
use super::catalog::{CityBoundary, CityVault};
use crate::notifications::{AppNotification, NotificationKind, NotificationLog};
use crate::storage::KeyValueStore;

/// How long the welcome toast stays on screen.
pub const WELCOME_TOAST_DURATION: Duration = Duration::from_secs(8);

/// Characters of the welcome message shown in the system notification body.
const SYSTEM_BODY_CHARS: usize = 100;

/// In-app toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub duration: Duration,
}

/// OS-level notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNotification {
    pub title: String,
    pub body: String,
    /// Notifications with the same tag replace each other.
    pub tag: String,
}

/// Everything shown when the user arrives in a host city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeNotification {
    pub city_key: String,
    pub toast: Toast,
    pub system: SystemNotification,
}

impl WelcomeNotification {
    #[must_use]
    pub fn for_city(city: &CityBoundary, vault: &CityVault) -> Self {
        let title = format!("Welcome to {}!", city.name);
        let excerpt: String = vault.welcome_message.chars().take(SYSTEM_BODY_CHARS).collect();

        Self {
            city_key: city.city_key.to_owned(),
            toast: Toast {
                title: title.clone(),
                description: vault.motto.to_owned(),
                duration: WELCOME_TOAST_DURATION,
            },
            system: SystemNotification {
                title,
                body: format!("{excerpt}..."),
                tag: format!("welcome-{}", city.city_key),
            },
        }
    }
}

/// Capability for user-facing location notifications.
pub trait Notifier: Send + Sync {
    /// Show the welcome for a newly entered city.
    fn welcome(&self, notification: &WelcomeNotification);

    /// Show a currency-change or stadium-approach alert.
    fn travel_alert(&self, alert: &TravelAlert);

    /// Tell the user location is not available on this device.
    fn location_unsupported(&self);
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn welcome(&self, notification: &WelcomeNotification) {
        (**self).welcome(notification);
    }

    fn travel_alert(&self, alert: &TravelAlert) {
        (**self).travel_alert(alert);
    }

    fn location_unsupported(&self) {
        (**self).location_unsupported();
    }
}

/// Notifier that records welcomes in the in-app inbox and logs them.
///
/// A UI shell reads the inbox to render toasts; `system_enabled` reflects the
/// OS notification permission and only affects what is logged as delivered.
#[derive(Debug, Clone)]
pub struct InboxNotifier<S> {
    log: NotificationLog<S>,
    system_enabled: bool,
}

impl<S: KeyValueStore> InboxNotifier<S> {
    pub const fn new(store: S, system_enabled: bool) -> Self {
        Self {
            log: NotificationLog::new(store),
            system_enabled,
        }
    }

    #[must_use]
    pub const fn log(&self) -> &NotificationLog<S> {
        &self.log
    }
}

impl<S: KeyValueStore> Notifier for InboxNotifier<S> {
    fn welcome(&self, notification: &WelcomeNotification) {
        let entry = AppNotification::new(
            NotificationKind::Welcome,
            notification.toast.title.clone(),
            notification.toast.description.clone(),
        );

        if let Err(e) = self.log.push(entry) {
            warn!(error = %e, city = %notification.city_key, "Failed to store welcome notification");
        }

        info!(
            city = %notification.city_key,
            title = %notification.toast.title,
            system = self.system_enabled,
            tag = %notification.system.tag,
            "Welcome notification"
        );
    }

    fn travel_alert(&self, alert: &TravelAlert) {
        let kind = match alert.kind {
            TravelAlertKind::CurrencyChange => NotificationKind::Currency,
            TravelAlertKind::StadiumApproach => NotificationKind::Stadium,
        };

        if let Err(e) = self
            .log
            .push(AppNotification::new(kind, alert.title.clone(), alert.body.clone()))
        {
            warn!(error = %e, tag = %alert.tag, "Failed to store travel alert");
        }

        info!(
            title = %alert.title,
            system = self.system_enabled,
            tag = %alert.tag,
            "Travel alert"
        );
    }

    fn location_unsupported(&self) {
        warn!("Location is not supported on this device");
    }
}
