use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::persistence::ProgressStore;
use crate::progress::quests::QuestBundle;

const STORE_SCHEMA_VERSION: i64 = 1;

const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS store_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS progress_kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#;

pub const COMPLETED_MODULES_KEY: &str = "completed_modules";
pub const DAILY_QUESTS_KEY: &str = "daily_quests";

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Json(serde_json::Error),
    InvalidData(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(err) => write!(f, "sqlite error: {}", err),
            StoreError::Json(err) => write!(f, "json error: {}", err),
            StoreError::InvalidData(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// SQLite-backed key-value store for the device-local progress data.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.conn.execute_batch(STORE_SCHEMA)?;
        store.ensure_meta()?;
        Ok(store)
    }

    fn ensure_meta(&self) -> Result<(), StoreError> {
        let version: Option<i64> = self
            .conn
            .query_row(
                "SELECT schema_version FROM store_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match version {
            Some(version) if version == STORE_SCHEMA_VERSION => Ok(()),
            Some(version) => Err(StoreError::InvalidData(format!(
                "store_meta version mismatch (schema {}, expected {})",
                version, STORE_SCHEMA_VERSION
            ))),
            None => {
                self.conn.execute(
                    "INSERT INTO store_meta (id, schema_version) VALUES (1, ?1)",
                    params![STORE_SCHEMA_VERSION],
                )?;
                Ok(())
            }
        }
    }

    fn read_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM progress_kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn write_value(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO progress_kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl ProgressStore for SqliteStore {
    fn load_completed(&self) -> Result<Vec<u32>, StoreError> {
        match self.read_value(COMPLETED_MODULES_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_completed(&mut self, modules: &[u32]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(modules)?;
        self.write_value(COMPLETED_MODULES_KEY, &raw)
    }

    fn load_quests(&self) -> Result<Option<QuestBundle>, StoreError> {
        match self.read_value(DAILY_QUESTS_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_quests(&mut self, bundle: &QuestBundle) -> Result<(), StoreError> {
        let raw = serde_json::to_string(bundle)?;
        self.write_value(DAILY_QUESTS_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::quest_templates::generate_daily_quests;

    #[test]
    fn completed_modules_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_completed().unwrap().is_empty());
        store.save_completed(&[1, 2, 5]).unwrap();
        assert_eq!(store.load_completed().unwrap(), vec![1, 2, 5]);
    }

    #[test]
    fn quest_bundle_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_quests().unwrap().is_none());
        let bundle = generate_daily_quests("2026-08-26");
        store.save_quests(&bundle).unwrap();
        let loaded = store.load_quests().unwrap().unwrap();
        assert_eq!(loaded.date, "2026-08-26");
        assert_eq!(loaded.quests.len(), bundle.quests.len());
    }

    #[test]
    fn corrupt_value_surfaces_a_json_error() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .write_value(COMPLETED_MODULES_KEY, "not json")
            .unwrap();
        assert!(matches!(
            store.load_completed(),
            Err(StoreError::Json(_))
        ));
    }
}
