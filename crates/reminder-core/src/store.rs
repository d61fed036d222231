//! Persistent key-value storage for JSON documents.
//!
//! Collections are always loaded and saved whole. Reads are best effort
//! and fall back to a default; writes report their errors.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value. `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace a raw value.
    async fn set(&self, key: &str, value: String) -> StoreResult<()>;
}

/// Load and decode a JSON value, returning `fallback` on any failure.
pub async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, fallback: T) -> T {
    let raw = match store.get(key).await {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return fallback,
        Err(e) => {
            tracing::warn!(key, error = %e, "store read failed, using fallback");
            return fallback;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "stored value is not valid JSON, using fallback");
            fallback
        }
    }
}

/// Encode and store a JSON value.
pub async fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value)?;
    if let Err(e) = store.set(key, raw).await {
        tracing::warn!(key, error = %e, "store write failed");
        return Err(e);
    }
    Ok(())
}

/// A stored JSON list split into decoded records and the raw records that
/// could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredList<T> {
    pub records: Vec<T>,
    /// Kept verbatim and written back on save.
    pub unreadable: Vec<serde_json::Value>,
}

impl<T> Default for StoredList<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            unreadable: Vec::new(),
        }
    }
}

/// Load a JSON list, decoding each element on its own.
///
/// An element `decode` rejects is set aside instead of discarding the
/// whole list. A value that is not a list at all falls back to empty.
pub async fn load_json_list<T>(
    store: &dyn KeyValueStore,
    key: &str,
    mut decode: impl FnMut(&serde_json::Value) -> Option<T>,
) -> StoredList<T> {
    let raw: Vec<serde_json::Value> = load_json(store, key, Vec::new()).await;
    let mut list = StoredList::default();
    for (index, value) in raw.into_iter().enumerate() {
        match decode(&value) {
            Some(record) => list.records.push(record),
            None => {
                tracing::warn!(key, index, "skipping unreadable stored record");
                list.unreadable.push(value);
            }
        }
    }
    list
}

/// Save `records` followed by the unreadable raw elements.
pub async fn save_json_list<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    records: &[T],
    unreadable: &[serde_json::Value],
) -> StoreResult<()> {
    let mut values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    values.extend(unreadable.iter().cloned());
    save_json(store, key, &values).await
}

/// Fixed storage keys for one app variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Task collection.
    pub task_list: &'static str,
    /// Final name to id map used when re-adding tasks.
    pub task_id_map: &'static str,
    /// Daily completion logs.
    pub history: &'static str,
}

impl StorageKeys {
    /// Keys used by the task reminder app.
    pub fn alimi() -> Self {
        Self {
            task_list: "BORINE_ALIMI_TASK_LIST",
            task_id_map: "BORINE_ALIMI_TASK_ID_MAP",
            history: "BORINE_ALIMI_TASK_HISTORY",
        }
    }

    /// Keys used by the medication tracker.
    pub fn medication() -> Self {
        Self {
            task_list: "BORINE_MEDICATION_LIST",
            task_id_map: "BORINE_MEDICATION_ID_MAP",
            history: "BORINE_MEDICATION_HISTORY",
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::alimi()
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Directory-backed store, one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the platform data directory for `app`.
    pub fn for_app(app: &str) -> StoreResult<Self> {
        directories::ProjectDirs::from("", "", app)
            .map(|d| Self::new(d.data_dir()))
            .ok_or(StoreError::NoDataDir)
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }
}
