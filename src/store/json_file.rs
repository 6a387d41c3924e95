//! JSON file persistence
//!
//! The whole mapping is one JSON object. Every mutation re-reads the file,
//! applies the change and writes `<path>.tmp` before renaming it over
//! `<path>`, so readers see either the old or the new file and never a torn
//! one. The read-modify-write cycle is serialized by a mutex per store.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{LinkStore, StoreError};
use crate::models::LinkRecord;

/// Load a JSON object map, treating a missing file as empty
pub(crate) fn read_map<T: DeserializeOwned>(
    path: &Path,
) -> Result<IndexMap<String, T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(IndexMap::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(IndexMap::new());
    }

    serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a JSON object map via temp file + rename
pub(crate) fn write_map_atomic<T: Serialize>(
    path: &Path,
    map: &IndexMap<String, T>,
) -> Result<(), StoreError> {
    let tmp_path = tmp_path_for(path);
    let io_err = |source: std::io::Error| StoreError::Io {
        path: tmp_path.clone(),
        source,
    };

    let json = serde_json::to_vec_pretty(map).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let mut file = fs::File::create(&tmp_path).map_err(io_err)?;
    file.write_all(&json).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `<path>.tmp`
pub(crate) fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Recover the guard of a poisoned lock; the guarded data is `()`
pub(crate) fn lock(mutex: &Mutex<()>) -> MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Persisted value for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredLink {
    platform: String,
    player_id: String,
}

/// Link store backed by a single JSON file
pub struct JsonLinkStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinkStore {
    /// Open the store, validating any existing file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        read_map::<StoredLink>(&path)?;
        tracing::info!("Using JSON link store at {:?}", path);

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<IndexMap<String, StoredLink>, StoreError> {
        read_map(&self.path)
    }
}

impl LinkStore for JsonLinkStore {
    fn put(&self, user_id: &str, platform: &str, player_id: &str) -> Result<(), StoreError> {
        let _guard = lock(&self.write_lock);
        let mut links = self.load()?;
        links.insert(
            user_id.to_string(),
            StoredLink {
                platform: platform.to_string(),
                player_id: player_id.to_string(),
            },
        );
        write_map_atomic(&self.path, &links)
    }

    fn put_if_absent(
        &self,
        user_id: &str,
        platform: &str,
        player_id: &str,
    ) -> Result<bool, StoreError> {
        let _guard = lock(&self.write_lock);
        let mut links = self.load()?;
        if links.contains_key(user_id) {
            return Ok(false);
        }
        links.insert(
            user_id.to_string(),
            StoredLink {
                platform: platform.to_string(),
                player_id: player_id.to_string(),
            },
        );
        write_map_atomic(&self.path, &links)?;
        Ok(true)
    }

    fn get(&self, user_id: &str) -> Result<Option<(String, String)>, StoreError> {
        let _guard = lock(&self.write_lock);
        Ok(self
            .load()?
            .shift_remove(user_id)
            .map(|link| (link.platform, link.player_id)))
    }

    fn delete(&self, user_id: &str) -> Result<bool, StoreError> {
        let _guard = lock(&self.write_lock);
        let mut links = self.load()?;
        if links.shift_remove(user_id).is_none() {
            return Ok(false);
        }
        write_map_atomic(&self.path, &links)?;
        Ok(true)
    }

    fn list(&self) -> Result<Vec<LinkRecord>, StoreError> {
        let _guard = lock(&self.write_lock);
        Ok(self
            .load()?
            .into_iter()
            .map(|(user_id, link)| LinkRecord {
                user_id,
                platform: link.platform,
                player_id: link.player_id,
            })
            .collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = lock(&self.write_lock);
        write_map_atomic(&self.path, &IndexMap::<String, StoredLink>::new())
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}
