use bevy_ecs::prelude::*;

use crate::core::session::{ActionQueue, Effect, EffectQueue, LearnerAction, ProgressEventLog, Today};
use crate::data::quest_templates::generate_daily_quests;
use crate::progress::quests::{QuestLog, QuestType};
use crate::systems::gamification::{XpAward, XpAwardLog, XpSource};

/// Resource carrying quest progress inputs raised earlier in the tick.
#[derive(Resource, Default, Debug)]
pub struct QuestEventQueue(pub Vec<(QuestType, u32)>);

/// System: lazy midnight rollover. When the stored bundle's date tag does
/// not match today, the full quest list is regenerated from the templates
/// and persisted.
pub fn quest_rollover_system(
    today: Res<Today>,
    mut log: ResMut<QuestLog>,
    mut effects: ResMut<EffectQueue>,
    mut events: ResMut<ProgressEventLog>,
) {
    if !log.bundle.is_stale(&today.0) {
        return;
    }
    log.bundle = generate_daily_quests(&today.0);
    effects.0.push(Effect::SaveQuests(log.bundle.clone()));
    events.0.push(format!("Daily quests refreshed for {}", today.0));
}

/// System: feeds the tick's events into quest progress and releases quest
/// rewards. The xp-type quests accumulate every non-quest XP award of the
/// tick; quest rewards themselves do not feed back into quest progress.
pub fn quest_progress_system(
    queue: Res<ActionQueue>,
    mut pending: ResMut<QuestEventQueue>,
    mut awards: ResMut<XpAwardLog>,
    mut log: ResMut<QuestLog>,
    mut effects: ResMut<EffectQueue>,
    mut events: ResMut<ProgressEventLog>,
) {
    let mut inputs = std::mem::take(&mut pending.0);
    for action in &queue.0 {
        if matches!(action, LearnerAction::RecordLogin) {
            inputs.push((QuestType::Login, 1));
        }
    }
    let base_xp: u32 = awards
        .0
        .iter()
        .filter(|award| !matches!(award.source, XpSource::Quest(_)))
        .map(|award| award.amount)
        .sum();
    if base_xp > 0 {
        inputs.push((QuestType::Xp, base_xp));
    }
    if inputs.is_empty() {
        return;
    }

    let mut rewards = Vec::new();
    for (quest_type, amount) in inputs {
        rewards.extend(log.bundle.apply_progress(quest_type, amount));
    }
    for reward in rewards {
        events.0.push(format!(
            "Quest '{}' completed (+{} XP)",
            reward.quest_id, reward.xp_reward
        ));
        awards.0.push(XpAward {
            amount: reward.xp_reward,
            source: XpSource::Quest(reward.quest_id),
        });
    }
    effects.0.push(Effect::SaveQuests(log.bundle.clone()));
}
