//! In-app notification log.
//!
//! Notifications are kept newest-first as a JSON array under
//! [`keys::NOTIFICATIONS`], capped at [`MAX_STORED_NOTIFICATIONS`] entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::storage::{KeyValueStore, StorageError, keys};

/// Oldest entries beyond this count are dropped.
pub const MAX_STORED_NOTIFICATIONS: usize = 50;

/// Category of an in-app notification.
///
/// The inbox is shared with other parts of the app, so every category it may
/// hold is listed even though this crate only raises welcome, stadium and
/// currency entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Welcome,
    Weather,
    Gameday,
    Safety,
    Transport,
    General,
    Reminder,
    Stadium,
    Currency,
    MatchResult,
}

/// A notification shown in the in-app inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppNotification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl AppNotification {
    /// A new unread notification stamped now.
    #[must_use]
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            body: body.into(),
            timestamp: Utc::now(),
            read: false,
            action_url: None,
        }
    }

    #[must_use]
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }
}

/// Persistent notification inbox over a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct NotificationLog<S> {
    store: S,
}

impl<S: KeyValueStore> NotificationLog<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// All stored notifications, newest first.
    ///
    /// Unreadable or corrupt data reads as an empty inbox.
    pub fn all(&self) -> Vec<AppNotification> {
        let raw = match self.store.get(keys::NOTIFICATIONS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read notifications");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding corrupt notification log");
            Vec::new()
        })
    }

    /// Prepend `notification`, dropping the oldest beyond the cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn push(&self, notification: AppNotification) -> Result<(), StorageError> {
        let mut notifications = self.all();
        notifications.insert(0, notification);
        notifications.truncate(MAX_STORED_NOTIFICATIONS);
        self.write(&notifications)
    }

    /// Mark one notification read. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn mark_read(&self, id: Uuid) -> Result<(), StorageError> {
        let mut notifications = self.all();
        let mut changed = false;
        for notification in notifications.iter_mut().filter(|n| n.id == id && !n.read) {
            notification.read = true;
            changed = true;
        }
        if changed {
            self.write(&notifications)?;
        }
        Ok(())
    }

    pub fn unread_count(&self) -> usize {
        self.all().iter().filter(|n| !n.read).count()
    }

    /// Delete every stored notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(keys::NOTIFICATIONS)
    }

    fn write(&self, notifications: &[AppNotification]) -> Result<(), StorageError> {
        let json = serde_json::to_string(notifications)?;
        self.store.set(keys::NOTIFICATIONS, &json)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_push_is_newest_first() {
        let log = NotificationLog::new(MemoryStore::new());
        log.push(AppNotification::new(NotificationKind::General, "first", ""))
            .unwrap();
        log.push(AppNotification::new(NotificationKind::Welcome, "second", ""))
            .unwrap();

        let all = log.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "second");
        assert_eq!(all[1].title, "first");
    }

    #[test]
    fn test_push_caps_stored_entries() {
        let log = NotificationLog::new(MemoryStore::new());
        for i in 0..(MAX_STORED_NOTIFICATIONS + 5) {
            log.push(AppNotification::new(NotificationKind::General, format!("n{i}"), ""))
                .unwrap();
        }
        let all = log.all();
        assert_eq!(all.len(), MAX_STORED_NOTIFICATIONS);
        assert_eq!(all[0].title, format!("n{}", MAX_STORED_NOTIFICATIONS + 4));
    }

    #[test]
    fn test_mark_read_and_unread_count() {
        let log = NotificationLog::new(MemoryStore::new());
        let first = AppNotification::new(NotificationKind::Safety, "a", "");
        let id = first.id;
        log.push(first).unwrap();
        log.push(AppNotification::new(NotificationKind::Safety, "b", ""))
            .unwrap();
        assert_eq!(log.unread_count(), 2);

        log.mark_read(id).unwrap();
        assert_eq!(log.unread_count(), 1);
        log.mark_read(Uuid::new_v4()).unwrap();
        assert_eq!(log.unread_count(), 1);
    }

    #[test]
    fn test_corrupt_log_reads_empty() {
        let store = MemoryStore::with_entries([(keys::NOTIFICATIONS, "{not json")]);
        let log = NotificationLog::new(store);
        assert!(log.all().is_empty());
    }

    #[test]
    fn test_clear() {
        let log = NotificationLog::new(MemoryStore::new());
        log.push(AppNotification::new(NotificationKind::General, "x", ""))
            .unwrap();
        log.clear().unwrap();
        assert!(log.all().is_empty());
    }

    #[test]
    fn test_wire_shape_uses_type_field() {
        let n = AppNotification::new(NotificationKind::MatchResult, "t", "b")
            .with_action_url("/matches");
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "matchResult");
        assert_eq!(value["actionUrl"], "/matches");
    }

    #[test]
    fn test_reads_entries_written_by_the_app() {
        let raw = r#"[{"id":"6f1c2a34-8d0e-4b55-9a7c-1e2f3a4b5c6d","type":"matchResult","title":"Full time","body":"2-1","timestamp":"2026-06-12T20:00:00Z","read":false}]"#;
        let log = NotificationLog::new(MemoryStore::with_entries([(keys::NOTIFICATIONS, raw)]));
        let all = log.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, NotificationKind::MatchResult);
        assert_eq!(all[0].action_url, None);
    }
}
