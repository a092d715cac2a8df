// SPDX-License-Identifier: GPL-3.0-only

//! Persistence mirror for the gallery and overlay selection
//!
//! The mirror is a passive copy of in-memory state: it is read once at
//! startup and written after every mutation. Write failures are logged and
//! swallowed, leaving the in-memory state authoritative.

use crate::app::gallery::PhotoRecord;
use crate::constants::storage_keys;
use crate::errors::StorageError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// String-keyed store with synchronous reads and writes
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store, mainly for tests
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `set` fail (simulates a full or blocked store)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw value currently stored under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self
            .values
            .lock()
            .map_err(|_| StorageError::Io("store lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io("quota exceeded".into()));
        }
        let mut values = self
            .values
            .lock()
            .map_err(|_| StorageError::Io("store lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file
///
/// The whole object is rewritten on every `set` through a temporary file
/// and a rename, so a crash never leaves a truncated mirror behind.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| StorageError::Malformed {
                key: path.display().to_string(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = values.len(), "Opened storage file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(values).map_err(|e| StorageError::Io(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self
            .values
            .lock()
            .map_err(|_| StorageError::Io("store lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StorageError::Io("store lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }
}

/// Typed view over a [`KeyValueStore`] for the keys this app owns
#[derive(Clone)]
pub struct PersistenceMirror {
    store: std::sync::Arc<dyn KeyValueStore>,
}

impl PersistenceMirror {
    pub fn new(store: std::sync::Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the gallery; missing key means an empty gallery
    pub fn load_photos(&self) -> Result<Vec<PhotoRecord>, StorageError> {
        let Some(json) = self.store.get(storage_keys::CAPTURED_PHOTOS)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&json).map_err(|e| StorageError::Malformed {
            key: storage_keys::CAPTURED_PHOTOS.to_string(),
            reason: e.to_string(),
        })
    }

    /// Write the gallery, logging and swallowing failures
    pub fn save_photos(&self, photos: &[PhotoRecord]) {
        let json = match serde_json::to_string(photos) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize gallery");
                return;
            }
        };
        if let Err(e) = self.store.set(storage_keys::CAPTURED_PHOTOS, &json) {
            warn!(error = %e, count = photos.len(), "Failed to persist gallery");
        } else {
            debug!(count = photos.len(), "Gallery persisted");
        }
    }

    /// Load the overlay selection; `Some(None)` means "explicitly none"
    pub fn load_overlay(&self) -> Result<Option<Option<String>>, StorageError> {
        Ok(self
            .store
            .get(storage_keys::SELECTED_OVERLAY)?
            .map(|id| if id.is_empty() { None } else { Some(id) }))
    }

    /// Write the overlay selection, logging and swallowing failures
    pub fn save_overlay(&self, overlay: Option<&str>) {
        if let Err(e) = self
            .store
            .set(storage_keys::SELECTED_OVERLAY, overlay.unwrap_or_default())
        {
            warn!(error = %e, "Failed to persist overlay selection");
        }
    }
}
