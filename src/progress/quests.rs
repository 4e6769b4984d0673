use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestType {
    Xp,
    Module,
    Login,
}

/// One daily engagement goal. `completed` mirrors `progress >= goal` and
/// never reverts within a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub text: String,
    pub goal: u32,
    pub progress: u32,
    pub completed: bool,
    pub xp_reward: u32,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
}

/// The persisted daily quest bundle: a date tag plus the quest list for
/// that day. A mismatched tag means the bundle is stale and must be
/// regenerated from the templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestBundle {
    pub date: String,
    pub quests: Vec<Quest>,
}

/// XP reward released by a quest crossing its completion threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestReward {
    pub quest_id: String,
    pub xp_reward: u32,
}

impl QuestBundle {
    pub fn is_stale(&self, today: &str) -> bool {
        self.date != today
    }

    /// Accumulate `amount` on every pending quest of `quest_type`, clamped
    /// to the goal. Quests that cross their goal flip to completed exactly
    /// once and surface their reward. Completed quests are untouched.
    pub fn apply_progress(&mut self, quest_type: QuestType, amount: u32) -> Vec<QuestReward> {
        let mut rewards = Vec::new();
        if amount == 0 {
            return rewards;
        }
        for quest in self
            .quests
            .iter_mut()
            .filter(|quest| quest.quest_type == quest_type && !quest.completed)
        {
            quest.progress = quest.progress.saturating_add(amount).min(quest.goal);
            if quest.progress >= quest.goal {
                quest.completed = true;
                rewards.push(QuestReward {
                    quest_id: quest.id.clone(),
                    xp_reward: quest.xp_reward,
                });
            }
        }
        rewards
    }
}

/// Resource wrapper holding the active bundle.
#[derive(Resource, Debug, Clone, Default)]
pub struct QuestLog {
    pub bundle: QuestBundle,
}
