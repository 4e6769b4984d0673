use std::collections::HashMap;

use crate::persistence::sqlite::{COMPLETED_MODULES_KEY, DAILY_QUESTS_KEY};
use crate::persistence::{ProgressStore, StoreError};
use crate::progress::quests::QuestBundle;

/// Map-backed store for tests and guest sessions without a durable path.
/// Values go through the same JSON encoding as the SQLite store so parse
/// failures behave identically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_raw(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl ProgressStore for MemoryStore {
    fn load_completed(&self) -> Result<Vec<u32>, StoreError> {
        match self.values.get(COMPLETED_MODULES_KEY) {
            Some(raw) => Ok(serde_json::from_str(raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_completed(&mut self, modules: &[u32]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(modules)?;
        self.values.insert(COMPLETED_MODULES_KEY.to_string(), raw);
        Ok(())
    }

    fn load_quests(&self) -> Result<Option<QuestBundle>, StoreError> {
        match self.values.get(DAILY_QUESTS_KEY) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save_quests(&mut self, bundle: &QuestBundle) -> Result<(), StoreError> {
        let raw = serde_json::to_string(bundle)?;
        self.values.insert(DAILY_QUESTS_KEY.to_string(), raw);
        Ok(())
    }
}
