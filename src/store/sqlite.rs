//! SQLite link store

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{LinkStore, StoreError};
use crate::models::LinkRecord;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS linked_profiles (
        discord_id TEXT PRIMARY KEY,
        platform TEXT NOT NULL,
        player_id TEXT NOT NULL
    )
";

/// Link store backed by a SQLite database
pub struct SqliteLinkStore {
    conn: Mutex<Connection>,
}

impl SqliteLinkStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let store = Self::with_connection(conn)?;
        tracing::info!("Using SQLite link store at {:?}", path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LinkStore for SqliteLinkStore {
    fn put(&self, user_id: &str, platform: &str, player_id: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO linked_profiles (discord_id, platform, player_id)
             VALUES (?1, ?2, ?3)",
            params![user_id, platform, player_id],
        )?;
        Ok(())
    }

    fn put_if_absent(
        &self,
        user_id: &str,
        platform: &str,
        player_id: &str,
    ) -> Result<bool, StoreError> {
        let changes = self.conn().execute(
            "INSERT OR IGNORE INTO linked_profiles (discord_id, platform, player_id)
             VALUES (?1, ?2, ?3)",
            params![user_id, platform, player_id],
        )?;
        Ok(changes > 0)
    }

    fn get(&self, user_id: &str) -> Result<Option<(String, String)>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT platform, player_id FROM linked_profiles WHERE discord_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    fn delete(&self, user_id: &str) -> Result<bool, StoreError> {
        let changes = self.conn().execute(
            "DELETE FROM linked_profiles WHERE discord_id = ?1",
            params![user_id],
        )?;
        Ok(changes > 0)
    }

    fn list(&self) -> Result<Vec<LinkRecord>, StoreError> {
        let conn = self.conn();
        let mut statement = conn.prepare(
            "SELECT discord_id, platform, player_id FROM linked_profiles ORDER BY rowid",
        )?;
        let records = statement
            .query_map([], |row| {
                Ok(LinkRecord {
                    user_id: row.get(0)?,
                    platform: row.get(1)?,
                    player_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.conn().execute("DELETE FROM linked_profiles", [])?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_contract() {
        let store = SqliteLinkStore::open_in_memory().unwrap();
        crate::store::tests::exercise_link_store(&store);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.db");

        SqliteLinkStore::open(&path)
            .unwrap()
            .put("u", "steam", "42")
            .unwrap();

        let reopened = SqliteLinkStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("u").unwrap(),
            Some(("steam".to_string(), "42".to_string()))
        );
    }
}
