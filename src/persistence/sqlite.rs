use std::fs;
use std::path::Path;

use bevy_utils::tracing::{debug, info};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::persistence::repository::{PreferenceError, PreferenceStore};

const PREFS_SCHEMA_VERSION: i64 = 1;

const PREFS_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS prefs_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS preferences (
  pref_key TEXT PRIMARY KEY,
  pref_value TEXT NOT NULL,
  updated_at TEXT NOT NULL
);
"#;

/// Preference store backed by a single SQLite file.
pub struct SqlitePreferenceStore {
    conn: Connection,
}

impl SqlitePreferenceStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        info!("opening preference store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, PreferenceError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PreferenceError> {
        let mut store = Self { conn };
        store.conn.execute_batch(PREFS_DB_SCHEMA)?;
        store.ensure_prefs_meta()?;
        Ok(store)
    }

    #[cfg(test)]
    fn keys(&self) -> Result<Vec<String>, PreferenceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT pref_key FROM preferences ORDER BY pref_key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    fn ensure_prefs_meta(&mut self) -> Result<(), PreferenceError> {
        let schema_version = self
            .conn
            .query_row(
                "SELECT schema_version FROM prefs_meta WHERE id = 1",
                [],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match schema_version {
            Some(PREFS_SCHEMA_VERSION) => {}
            Some(found) => {
                return Err(PreferenceError::InvalidData(format!(
                    "prefs_meta version mismatch (schema {}, expected {})",
                    found, PREFS_SCHEMA_VERSION
                )));
            }
            None => {
                debug!("initialising prefs_meta at schema {}", PREFS_SCHEMA_VERSION);
                self.conn.execute(
                    "INSERT INTO prefs_meta (id, schema_version) VALUES (1, ?1)",
                    params![PREFS_SCHEMA_VERSION],
                )?;
            }
        }
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let value = self
            .conn
            .query_row(
                "SELECT pref_value FROM preferences WHERE pref_key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.conn.execute(
            "INSERT INTO preferences (pref_key, pref_value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(pref_key) DO UPDATE
             SET pref_value = excluded.pref_value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let store = SqlitePreferenceStore::open_in_memory().unwrap();
        assert_eq!(store.get("playerProgress").unwrap(), None);
    }

    #[test]
    fn set_overwrites_previous_value() {
        let mut store = SqlitePreferenceStore::open_in_memory().unwrap();
        store.set("gameSettings", "{}").unwrap();
        store.set("gameSettings", r#"{"haptic_feedback":false}"#).unwrap();
        assert_eq!(
            store.get("gameSettings").unwrap().as_deref(),
            Some(r#"{"haptic_feedback":false}"#)
        );
        assert_eq!(store.keys().unwrap(), vec!["gameSettings".to_string()]);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.db");
        {
            let mut store = SqlitePreferenceStore::open(&path).unwrap();
            store.set("playerProgress", r#"{"total_points":100}"#).unwrap();
        }
        let store = SqlitePreferenceStore::open(&path).unwrap();
        assert_eq!(
            store.get("playerProgress").unwrap().as_deref(),
            Some(r#"{"total_points":100}"#)
        );
    }

    #[test]
    fn newer_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.db");
        {
            let store = SqlitePreferenceStore::open(&path).unwrap();
            store
                .conn
                .execute("UPDATE prefs_meta SET schema_version = 99 WHERE id = 1", [])
                .unwrap();
        }
        let err = SqlitePreferenceStore::open(&path).err().expect("version mismatch");
        assert!(err.to_string().contains("version mismatch"));
    }
}
