//! Cached profile snapshots
//!
//! One JSON object keyed by user id. The cache is advisory: everything in it
//! can be rebuilt by refreshing the profiles, so there is no SQLite variant.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::json_file::{lock, read_map, write_map_atomic};
use super::StoreError;
use crate::models::ProfileSnapshot;

/// Snapshot cache backed by a single JSON file
pub struct SnapshotCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotCache {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        read_map::<ProfileSnapshot>(&path)?;

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or overwrite the snapshot for `user_id`
    pub fn upsert(&self, user_id: &str, snapshot: &ProfileSnapshot) -> Result<(), StoreError> {
        let _guard = lock(&self.write_lock);
        let mut snapshots: IndexMap<String, ProfileSnapshot> = read_map(&self.path)?;
        snapshots.insert(user_id.to_string(), snapshot.clone());
        write_map_atomic(&self.path, &snapshots)?;

        tracing::debug!("Cached snapshot for {} ({} total)", user_id, snapshots.len());
        Ok(())
    }

    /// All snapshots in file order, with `user_id` filled in from the key
    pub fn get_all(&self) -> Result<IndexMap<String, ProfileSnapshot>, StoreError> {
        let _guard = lock(&self.write_lock);
        let mut snapshots: IndexMap<String, ProfileSnapshot> = read_map(&self.path)?;
        for (user_id, snapshot) in snapshots.iter_mut() {
            snapshot.user_id = user_id.clone();
        }
        Ok(snapshots)
    }

    pub fn get(&self, user_id: &str) -> Result<Option<ProfileSnapshot>, StoreError> {
        Ok(self.get_all()?.shift_remove(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileStats;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    use std::sync::Arc;

    fn snapshot(wins: &str) -> ProfileSnapshot {
        ProfileSnapshot {
            user_id: String::new(),
            platform: "steam".to_string(),
            player_id: "7656".to_string(),
            captured_at: Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap(),
            stats: ProfileStats {
                wins: wins.to_string(),
                ..ProfileStats::default()
            },
        }
    }

    #[test]
    fn test_upsert_overwrites() {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCache::open(dir.path().join("cache.json")).unwrap();

        cache.upsert("u", &snapshot("10")).unwrap();
        cache.upsert("u", &snapshot("11")).unwrap();

        let all = cache.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["u"].stats.wins, "11");
        assert_eq!(all["u"].user_id, "u");
    }

    #[test]
    fn test_get_all_keeps_insertion_order() {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCache::open(dir.path().join("cache.json")).unwrap();

        for user in ["c", "a", "b"] {
            cache.upsert(user, &snapshot("1")).unwrap();
        }

        let keys: Vec<_> = cache.get_all().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_file_layout() {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCache::open(dir.path().join("cache.json")).unwrap();
        cache.upsert("99", &snapshot("5")).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
        let entry = &value["99"];
        assert_eq!(entry["player_id"], "7656");
        assert_eq!(entry["last_updated"], "2025-07-01T09:30:00Z");
        assert_eq!(entry["wins"], "5");
        assert_eq!(entry["assists"], "N/A");
    }

    #[test]
    fn test_get_missing() {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCache::open(dir.path().join("cache.json")).unwrap();
        assert!(cache.get("nobody").unwrap().is_none());
        assert!(cache.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_upserts_do_not_lose_snapshots() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(SnapshotCache::open(dir.path().join("cache.json")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .upsert(&format!("user{}", i), &snapshot(&i.to_string()))
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let all = cache.get_all().unwrap();
        assert_eq!(all.len(), 8);
        assert_eq!(all["user3"].stats.wins, "3");
    }
}
