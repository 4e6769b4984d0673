pub mod memory;
pub mod sqlite;

use crate::progress::quests::QuestBundle;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreError};

/// Durable client-side key-value storage for progress data. Values are
/// JSON-serialized; keys are fixed strings owned by the store.
pub trait ProgressStore {
    fn load_completed(&self) -> Result<Vec<u32>, StoreError>;
    fn save_completed(&mut self, modules: &[u32]) -> Result<(), StoreError>;
    fn load_quests(&self) -> Result<Option<QuestBundle>, StoreError>;
    fn save_quests(&mut self, bundle: &QuestBundle) -> Result<(), StoreError>;
}
