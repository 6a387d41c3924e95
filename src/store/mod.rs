//! Persistence for profile links and scraped snapshots
//!
//! Links live behind the [`LinkStore`] trait with two backends: SQLite
//! (when compiled with the `sqlite` feature and the database opens) and a
//! single JSON file. The backend is picked once by [`open_link_store`];
//! callers only ever hold an `Arc<dyn LinkStore>`.
//!
//! Snapshots live in a JSON file managed by [`SnapshotCache`].

mod json_file;
mod snapshots;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use json_file::JsonLinkStore;
pub use snapshots::SnapshotCache;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLinkStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::models::LinkRecord;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Link backend unavailable: {0}")]
    Unavailable(String),
}

/// User id -> linked tracker profile
///
/// `put` replaces any existing link for the user.
pub trait LinkStore: Send + Sync {
    fn put(&self, user_id: &str, platform: &str, player_id: &str) -> Result<(), StoreError>;

    /// Insert only if the user has no link; returns false when one exists
    ///
    /// The check and the write are a single atomic step.
    fn put_if_absent(
        &self,
        user_id: &str,
        platform: &str,
        player_id: &str,
    ) -> Result<bool, StoreError>;

    /// Returns `(platform, player_id)`
    fn get(&self, user_id: &str) -> Result<Option<(String, String)>, StoreError>;

    /// Returns true if a link existed
    fn delete(&self, user_id: &str) -> Result<bool, StoreError>;

    fn list(&self) -> Result<Vec<LinkRecord>, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Which link backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkBackend {
    /// SQLite when available, JSON file otherwise
    #[default]
    Auto,
    Sqlite,
    Json,
}

impl FromStr for LinkBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "sqlite" | "db" => Ok(Self::Sqlite),
            "json" | "file" => Ok(Self::Json),
            other => Err(format!("unknown link backend '{}'", other)),
        }
    }
}

/// Storage locations
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub link_backend: LinkBackend,
}

impl StorageConfig {
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("linked_profiles.db")
    }

    pub fn links_json_path(&self) -> PathBuf {
        self.data_dir.join("linked_profiles.json")
    }

    pub fn snapshots_path(&self) -> PathBuf {
        self.data_dir.join("profile_cache.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            link_backend: LinkBackend::Auto,
        }
    }
}

/// Open the link store, probing for SQLite when the backend is `Auto`
pub fn open_link_store(config: &StorageConfig) -> Result<Arc<dyn LinkStore>, StoreError> {
    std::fs::create_dir_all(&config.data_dir).map_err(|source| StoreError::Io {
        path: config.data_dir.clone(),
        source,
    })?;

    match config.link_backend {
        LinkBackend::Json => Ok(Arc::new(JsonLinkStore::open(config.links_json_path())?)),
        LinkBackend::Sqlite => open_sqlite(config),
        LinkBackend::Auto => match open_sqlite(config) {
            Ok(store) => Ok(store),
            Err(e) => {
                tracing::warn!("SQLite link store unavailable ({}), using JSON file", e);
                Ok(Arc::new(JsonLinkStore::open(config.links_json_path())?))
            }
        },
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &StorageConfig) -> Result<Arc<dyn LinkStore>, StoreError> {
    Ok(Arc::new(SqliteLinkStore::open(config.sqlite_path())?))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &StorageConfig) -> Result<Arc<dyn LinkStore>, StoreError> {
    Err(StoreError::Unavailable(
        "built without the sqlite feature".to_string(),
    ))
}
