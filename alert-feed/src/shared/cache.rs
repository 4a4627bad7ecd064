//! Last-known-good alert cache.
//!
//! A single named slot in a durable key-value store holds the most recent
//! snapshot as a JSON array. The cache is only read when a live fetch fails.

use crate::error::CacheError;
use crate::shared::types::AlertRecord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Slot name holding the serialized alert list
pub const CACHE_KEY: &str = "cryptoAlerts";

/// Durable string slots addressed by key
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;

        // Write beside the target then rename so readers never see a torn file
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }
}

/// Process-local store, cleared when the process exits
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Alert list persisted under [`CACHE_KEY`]
#[derive(Clone)]
pub struct AlertCache {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for AlertCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AlertCache({CACHE_KEY})")
    }
}

impl AlertCache {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Overwrite the slot with `alerts` (last write wins)
    pub fn save(&self, alerts: &[AlertRecord]) {
        if let Err(e) = self.try_save(alerts) {
            warn!("Failed to write alert cache: {}", e);
        }
    }

    pub fn try_save(&self, alerts: &[AlertRecord]) -> Result<(), CacheError> {
        let json = serde_json::to_string(alerts)?;
        self.store.set(CACHE_KEY, &json)?;
        debug!("Cached {} alerts", alerts.len());
        Ok(())
    }

    /// Read the cached list; unreadable or corrupt content counts as empty
    pub fn load(&self) -> Vec<AlertRecord> {
        match self.try_load() {
            Ok(Some(alerts)) => alerts,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Ignoring unreadable alert cache: {}", e);
                Vec::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Option<Vec<AlertRecord>>, CacheError> {
        let Some(content) = self.store.get(CACHE_KEY)? else {
            return Ok(None);
        };
        let alerts = serde_json::from_str(&content)?;
        Ok(Some(alerts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<AlertRecord> {
        vec![
            AlertRecord {
                symbol: Some("BTCUSDT".to_string()),
                kind: Some("price_jump".to_string()),
                message: Some("Price up 5.2%".to_string()),
                timestamp: Some("2026-10-17T09:30:00".to_string()),
            },
            AlertRecord {
                symbol: Some("ethusdt".to_string()),
                kind: None,
                message: Some("Whale moved $2,500,000".to_string()),
                timestamp: None,
            },
        ]
    }

    #[test]
    fn test_load_after_save_round_trips() {
        let cache = AlertCache::new(MemoryStore::new());
        cache.save(&sample());
        assert_eq!(cache.load(), sample());
    }

    #[test]
    fn test_save_overwrites_previous_list() {
        let cache = AlertCache::new(MemoryStore::new());
        cache.save(&sample());
        cache.save(&sample()[..1]);
        assert_eq!(cache.load(), sample()[..1].to_vec());
    }

    #[test]
    fn test_load_empty_slot() {
        let cache = AlertCache::new(MemoryStore::new());
        assert!(cache.load().is_empty());
        assert!(matches!(cache.try_load(), Ok(None)));
    }

    #[test]
    fn test_load_corrupt_content_is_empty() {
        let store = MemoryStore::new();
        store.set(CACHE_KEY, "<html>not json</html>").unwrap();
        let cache = AlertCache::new(store);

        assert!(cache.load().is_empty());
        assert!(matches!(cache.try_load(), Err(CacheError::Serde(_))));
    }

    #[test]
    fn test_load_foreign_json_is_empty() {
        let store = MemoryStore::new();
        store.set(CACHE_KEY, r#"{"theme":"dark"}"#).unwrap();
        assert!(AlertCache::new(store).load().is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get(CACHE_KEY).unwrap(), None);
        store.set(CACHE_KEY, "[]").unwrap();
        assert_eq!(store.get(CACHE_KEY).unwrap().as_deref(), Some("[]"));
        assert!(store.dir().join("cryptoAlerts.json").exists());
    }

    #[test]
    fn test_file_backed_cache_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        AlertCache::new(FileStore::new(dir.path())).save(&sample());

        let reopened = AlertCache::new(FileStore::new(dir.path()));
        assert_eq!(reopened.load(), sample());
    }
}
