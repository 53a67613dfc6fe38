use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Full editor state (`SiteState` JSON).
pub const STATE_KEY: &str = "folio_admin_state_v1";
/// Set to `"1"` while the console is unlocked.
pub const AUTH_KEY: &str = "folio_admin_authed_v1";
/// Shared-secret token attached to proxy calls.
pub const SESSION_TOKEN_KEY: &str = "folio_console_token";
/// Shared-secret token for the builder proxies.
pub const ADMIN_TOKEN_KEY: &str = "folio_admin_token";
/// Last builder state successfully read from the repository.
pub const BUILDER_CACHE_KEY: &str = "folio_builder_last_repo_state";

/// File name of the local store inside a data directory.
pub const STORAGE_FILE: &str = "folio.db";

/// Persistent string key/value store, the console's local storage.
pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    /// Open or create the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = LocalStorage { conn };
        storage.initialize()?;
        Ok(storage)
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = LocalStorage { conn };
        storage.initialize()?;
        Ok(storage)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM local_storage WHERE key = ?1",
            params![key],
        )?;
        Ok(())
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM local_storage ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let storage = LocalStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_item(STATE_KEY).unwrap(), None);

        storage.set_item(STATE_KEY, "{}").unwrap();
        storage.set_item(STATE_KEY, "{\"pages\":[]}").unwrap();
        assert_eq!(
            storage.get_item(STATE_KEY).unwrap().as_deref(),
            Some("{\"pages\":[]}")
        );

        storage.remove_item(STATE_KEY).unwrap();
        assert_eq!(storage.get_item(STATE_KEY).unwrap(), None);
        // Removing a missing key is fine.
        storage.remove_item(STATE_KEY).unwrap();
    }

    #[test]
    fn test_keys_sorted() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_item(SESSION_TOKEN_KEY, "t").unwrap();
        storage.set_item(AUTH_KEY, "1").unwrap();
        assert_eq!(
            storage.keys().unwrap(),
            vec![AUTH_KEY.to_string(), SESSION_TOKEN_KEY.to_string()]
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(STORAGE_FILE);
        {
            let storage = LocalStorage::open(&path).unwrap();
            storage.set_item(AUTH_KEY, "1").unwrap();
        }
        let storage = LocalStorage::open(&path).unwrap();
        assert_eq!(storage.get_item(AUTH_KEY).unwrap().as_deref(), Some("1"));
    }
}
