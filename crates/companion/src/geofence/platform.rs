//! Platform location capability.
//!
//! The native wrapper (or a desktop shim) implements [`LocationPlatform`].
//! Position watches push [`WatchEvent`]s into a channel owned by the engine,
//! which drains it one event at a time.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use concierge_core::Coordinates;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Platform permission state for location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Granted,
    Prompt,
    Denied,
}

/// A single position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Unix milliseconds when the fix was taken.
    pub timestamp_ms: i64,
}

impl Position {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
        }
    }

    /// A fix at `latitude`/`longitude` stamped with the current time.
    #[must_use]
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, chrono::Utc::now().timestamp_millis())
    }

    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Why a position request or watch callback failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("timed out")]
    Timeout,
}

/// Failure to query platform permission state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission query failed: {0}")]
pub struct PermissionQueryError(pub String);

/// Options for position requests and watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the platform may return.
    pub maximum_age: Duration,
}

impl WatchOptions {
    /// City-radius matching tolerates tens of kilometres of error, so
    /// tracking favours battery life over precision.
    pub const BATTERY_SAVER: Self = Self {
        enable_high_accuracy: false,
        timeout: Duration::from_secs(30),
        maximum_age: Duration::from_secs(60),
    };
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::BATTERY_SAVER
    }
}

/// Handle identifying an active position watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Something delivered by an active position watch.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Position(Position),
    Error(PositionError),
}

/// Device location capability.
pub trait LocationPlatform: Send + Sync {
    /// Whether the device exposes location at all.
    fn is_supported(&self) -> bool;

    /// Current permission state.
    fn permission_state(
        &self,
    ) -> impl Future<Output = Result<PermissionState, PermissionQueryError>> + Send;

    /// Request a single fix. On a `Prompt` permission state this is what shows
    /// the system permission dialog.
    fn current_position(
        &self,
        options: WatchOptions,
    ) -> impl Future<Output = Result<Position, PositionError>> + Send;

    /// Begin delivering fixes into `events` until [`clear_watch`] is called.
    ///
    /// [`clear_watch`]: LocationPlatform::clear_watch
    fn watch_position(
        &self,
        options: WatchOptions,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) -> WatchId;

    /// Cancel a watch. Unknown ids are ignored.
    fn clear_watch(&self, id: WatchId);
}

impl<T: LocationPlatform + ?Sized> LocationPlatform for std::sync::Arc<T> {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn permission_state(
        &self,
    ) -> impl Future<Output = Result<PermissionState, PermissionQueryError>> + Send {
        (**self).permission_state()
    }

    fn current_position(
        &self,
        options: WatchOptions,
    ) -> impl Future<Output = Result<Position, PositionError>> + Send {
        (**self).current_position(options)
    }

    fn watch_position(
        &self,
        options: WatchOptions,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) -> WatchId {
        (**self).watch_position(options, events)
    }

    fn clear_watch(&self, id: WatchId) {
        (**self).clear_watch(id);
    }
}

// =============================================================================
// StaticPlatform
// =============================================================================

/// Platform with a fixed permission state and a position set by hand.
///
/// Used by the CLI and by tests; [`StaticPlatform::emit`] pushes a fix or an
/// error to every active watch.
#[derive(Debug)]
pub struct StaticPlatform {
    supported: bool,
    permission: Mutex<PermissionState>,
    position: Mutex<Option<Position>>,
    watches: Mutex<Vec<(WatchId, mpsc::UnboundedSender<WatchEvent>)>>,
    next_watch: AtomicU64,
}

impl StaticPlatform {
    /// A platform that supports location with the given permission state.
    #[must_use]
    pub fn new(permission: PermissionState) -> Self {
        Self {
            supported: true,
            permission: Mutex::new(permission),
            position: Mutex::new(None),
            watches: Mutex::new(Vec::new()),
            next_watch: AtomicU64::new(1),
        }
    }

    /// A platform without any location capability.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new(PermissionState::Denied)
        }
    }

    /// Set the fix returned by `current_position`.
    pub fn set_position(&self, position: Position) {
        if let Ok(mut current) = self.position.lock() {
            *current = Some(position);
        }
    }

    /// Change the permission state, as if the user answered a prompt.
    pub fn set_permission(&self, permission: PermissionState) {
        if let Ok(mut current) = self.permission.lock() {
            *current = permission;
        }
    }

    /// Deliver an event to every active watch. Returns how many received it.
    pub fn emit(&self, event: &WatchEvent) -> usize {
        if let WatchEvent::Position(position) = event {
            self.set_position(*position);
        }
        let Ok(mut watches) = self.watches.lock() else {
            return 0;
        };
        watches.retain(|(_, tx)| !tx.is_closed());
        watches
            .iter()
            .filter(|(_, tx)| tx.send(event.clone()).is_ok())
            .count()
    }

    /// Number of watches not yet cleared.
    #[must_use]
    pub fn active_watches(&self) -> usize {
        self.watches.lock().map_or(0, |watches| watches.len())
    }

    fn permission(&self) -> PermissionState {
        self.permission
            .lock()
            .map_or(PermissionState::Denied, |permission| *permission)
    }
}

impl LocationPlatform for StaticPlatform {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn permission_state(&self) -> Result<PermissionState, PermissionQueryError> {
        Ok(self.permission())
    }

    async fn current_position(&self, _options: WatchOptions) -> Result<Position, PositionError> {
        if self.permission() == PermissionState::Denied {
            return Err(PositionError::PermissionDenied);
        }
        // Answering the prompt by requesting a fix grants access.
        self.set_permission(PermissionState::Granted);
        self.position
            .lock()
            .ok()
            .and_then(|position| *position)
            .ok_or(PositionError::Unavailable)
    }

    fn watch_position(
        &self,
        _options: WatchOptions,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) -> WatchId {
        let id = WatchId(self.next_watch.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut watches) = self.watches.lock() {
            watches.push((id, events));
        }
        id
    }

    fn clear_watch(&self, id: WatchId) {
        if let Ok(mut watches) = self.watches.lock() {
            watches.retain(|(watch, _)| *watch != id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_saver_options() {
        let options = WatchOptions::default();
        assert!(!options.enable_high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.maximum_age, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_static_platform_watch_lifecycle() {
        let platform = StaticPlatform::new(PermissionState::Granted);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = platform.watch_position(WatchOptions::default(), tx);

        let fix = Position::new(39.0997, -94.5786, 1);
        assert_eq!(platform.emit(&WatchEvent::Position(fix)), 1);
        assert_eq!(rx.recv().await.unwrap(), WatchEvent::Position(fix));

        platform.clear_watch(id);
        assert_eq!(platform.active_watches(), 0);
        assert_eq!(platform.emit(&WatchEvent::Error(PositionError::Timeout)), 0);
    }

    #[tokio::test]
    async fn test_prompt_is_granted_by_position_request() {
        let platform = StaticPlatform::new(PermissionState::Prompt);
        platform.set_position(Position::new(1.0, 2.0, 3));

        let fix = platform.current_position(WatchOptions::default()).await.unwrap();
        assert!((fix.latitude - 1.0).abs() < f64::EPSILON);
        assert_eq!(
            platform.permission_state().await.unwrap(),
            PermissionState::Granted
        );
    }

    #[tokio::test]
    async fn test_denied_position_request() {
        let platform = StaticPlatform::new(PermissionState::Denied);
        assert_eq!(
            platform.current_position(WatchOptions::default()).await,
            Err(PositionError::PermissionDenied)
        );
    }
}
