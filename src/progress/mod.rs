pub mod quests;
pub mod stats;
pub mod tracker;

pub use quests::{Quest, QuestBundle, QuestLog, QuestType};
pub use stats::UserStats;
pub use tracker::ModuleProgress;
