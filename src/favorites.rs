//! Local persistence for favorites and the selected region.
//!
//! Values are opaque strings behind a [`KeyValueStore`]. On disk each key is
//! one file in the storage directory; writes go to a temp file first and are
//! renamed into place so a crash never leaves a half-written value.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use crate::config::{self, DEFAULT_REGION, FAVORITES_KEY, REGION_KEY};
use crate::error::{MarketError, Result};
use crate::models::FavoriteItem;

/// String key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileKeyValueStore
// ---------------------------------------------------------------------------

pub struct FileKeyValueStore {
    /// Directory holding one file per key.
    pub dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open a store rooted at `dir`, or the platform default when `None`.
    ///
    /// Creates the directory if it does not exist.
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        let dir = dir.unwrap_or_else(config::default_storage_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(MarketError::InvalidArgument(format!(
                "Invalid storage key: {:?}",
                key
            )));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| MarketError::Io(e.error))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryKeyValueStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| MarketError::InvalidArgument("key-value lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| MarketError::InvalidArgument("key-value lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Startup reads
// ---------------------------------------------------------------------------

/// Read the persisted favorites list.
///
/// A missing value is an empty list. A value that does not parse is logged
/// and treated as empty so a corrupt entry cannot block startup.
pub fn load_favorites(store: &dyn KeyValueStore) -> Result<Vec<FavoriteItem>> {
    let Some(raw) = store.get(FAVORITES_KEY)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Option<Vec<FavoriteItem>>>(&raw) {
        Ok(favorites) => Ok(favorites.unwrap_or_default()),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable favorites value");
            Ok(Vec::new())
        }
    }
}

pub fn save_favorites(store: &dyn KeyValueStore, favorites: &[FavoriteItem]) -> Result<()> {
    store.set(FAVORITES_KEY, &serde_json::to_string(favorites)?)
}

/// Read the persisted region display name, falling back to the default.
pub fn load_region(store: &dyn KeyValueStore) -> Result<String> {
    load_region_or(store, DEFAULT_REGION.to_string())
}

pub fn load_region_or(store: &dyn KeyValueStore, default: String) -> Result<String> {
    Ok(store
        .get(REGION_KEY)?
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or(default))
}

pub fn save_region(store: &dyn KeyValueStore, region: &str) -> Result<()> {
    store.set(REGION_KEY, region)
}
