//! Durable string key/value storage.
//!
//! The store only ever holds "last known good" values. Absence is a normal
//! result, not an error, and concurrent writers to one key resolve as
//! last-write-wins.

use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::WeatherError;

#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<String>, WeatherError>;
    async fn set(&self, key: &str, value: String) -> Result<(), WeatherError>;
    /// Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), WeatherError>;
}

/// A single JSON object file on disk, rewritten atomically on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "store.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_text(&self) -> Result<Option<String>, WeatherError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, WeatherError> {
        let Some(text) = self.read_text().await? else {
            return Ok(BTreeMap::new());
        };
        serde_json::from_str(&text).map_err(|e| {
            WeatherError::Storage(format!("corrupt store {}: {e}", self.path.display()))
        })
    }

    /// Entries to update. A file that does not parse is moved aside to
    /// `store.json.corrupt` and the update starts from an empty map.
    async fn read_for_update(&self) -> Result<BTreeMap<String, String>, WeatherError> {
        let Some(text) = self.read_text().await? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&text) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                let aside = self.path.with_extension("json.corrupt");
                warn!(path = %aside.display(), "Store does not parse, starting over: {e}");
                tokio::fs::rename(&self.path, &aside).await?;
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), WeatherError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| WeatherError::Storage(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, WeatherError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), WeatherError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_for_update().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await?;
        debug!(key, path = %self.path.display(), "Store entry written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), WeatherError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_for_update().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
            debug!(key, "Store entry removed");
        }
        Ok(())
    }
}

/// Process-local store, used for ephemeral runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, WeatherError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), WeatherError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), WeatherError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
