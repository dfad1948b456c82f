//! Durable local key/value storage.
//!
//! Every persisted value is a plain string under one of the well-known
//! [`keys`]. Stores are synchronous: each call reads and writes within one
//! turn, so the only concurrency rule is last writer wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

/// Storage keys shared with earlier releases of the app.
pub mod keys {
    /// Normalized subscriber email.
    pub const SUBSCRIPTION_EMAIL: &str = "subscription_email";

    /// Subscriber tier (`free`, `team_info`, ...).
    pub const SUBSCRIPTION_TIER: &str = "subscription_tier";

    /// Subscriber display name.
    pub const SUBSCRIPTION_NAME: &str = "subscription_name";

    /// Subscriber home city (display only).
    pub const SUBSCRIPTION_CITY: &str = "subscription_city";

    /// City key of the last geofence entry.
    pub const LAST_DETECTED_CITY: &str = "lastDetectedCity";

    /// `"true"` when location tracking should resume at launch.
    pub const LOCATION_TRACKING_ENABLED: &str = "locationTrackingEnabled";

    /// Number of free bracket downloads used on this device.
    pub const BRACKET_DOWNLOADS: &str = "bracketDownloads";

    /// JSON array of stored in-app notifications.
    pub const NOTIFICATIONS: &str = "notifications";

    /// Country code (`US`, `CA`, `MX`) of the last city entered.
    pub const LAST_DETECTED_COUNTRY: &str = "last_detected_country";

    /// JSON array of `{stadium}_{date}` approach alerts already shown.
    pub const STADIUM_ALERTS: &str = "stadium_proximity_alerts";

    /// All subscription keys, purged together.
    pub const SUBSCRIPTION: [&str; 4] = [
        SUBSCRIPTION_EMAIL,
        SUBSCRIPTION_TIER,
        SUBSCRIPTION_NAME,
        SUBSCRIPTION_CITY,
    ];
}

/// Errors that can occur when reading or writing local storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not contain a JSON string map.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A previous writer panicked while holding the lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A durable string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect(),
            ),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// JSON-file-backed store.
///
/// The whole map is held in memory and rewritten on every mutation through a
/// temporary file and rename, so a crash never leaves a half-written file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is treated as an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened local storage");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get(keys::SUBSCRIPTION_TIER).unwrap(), None);

        store.set(keys::SUBSCRIPTION_TIER, "free").unwrap();
        assert_eq!(
            store.get(keys::SUBSCRIPTION_TIER).unwrap().as_deref(),
            Some("free")
        );

        store.remove(keys::SUBSCRIPTION_TIER).unwrap();
        assert_eq!(store.get(keys::SUBSCRIPTION_TIER).unwrap(), None);
        store.remove(keys::SUBSCRIPTION_TIER).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::LAST_DETECTED_CITY, "kansasCity").unwrap();
        store.set(keys::LOCATION_TRACKING_ENABLED, "true").unwrap();
        store.remove(keys::LOCATION_TRACKING_ENABLED).unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::LAST_DETECTED_CITY).unwrap().as_deref(),
            Some("kansasCity")
        );
        assert_eq!(reopened.get(keys::LOCATION_TRACKING_ENABLED).unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_arc_store_shares_state() {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn KeyValueStore> = store.clone();
        shared.set(keys::BRACKET_DOWNLOADS, "1").unwrap();
        assert_eq!(store.get(keys::BRACKET_DOWNLOADS).unwrap().as_deref(), Some("1"));
    }
}
