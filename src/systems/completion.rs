use bevy_ecs::prelude::*;
use tracing::{debug, warn};

use crate::core::session::{ActionQueue, Effect, EffectQueue, LearnerAction, ProgressEventLog};
use crate::progress::quests::QuestType;
use crate::progress::tracker::ModuleProgress;
use crate::rules::reward::xp_reward_for_module;
use crate::systems::gamification::{XpAward, XpAwardLog, XpSource};
use crate::systems::quests::QuestEventQueue;

/// System: applies module completions and progress resets.
///
/// Completion is a test-and-set on the module set, so repeated events for
/// the same module award XP at most once. The local save effect is queued
/// ahead of the remote insert, keeping the completion durable even if the
/// process dies before the remote call runs.
pub fn module_completion_system(
    queue: Res<ActionQueue>,
    mut progress: ResMut<ModuleProgress>,
    mut awards: ResMut<XpAwardLog>,
    mut quest_events: ResMut<QuestEventQueue>,
    mut effects: ResMut<EffectQueue>,
    mut events: ResMut<ProgressEventLog>,
) {
    for action in &queue.0 {
        match action {
            LearnerAction::CompleteModule { module_id } => {
                let module_id = *module_id;
                if module_id == 0 {
                    warn!("ignoring completion for invalid module id 0");
                    continue;
                }
                if !progress.insert(module_id) {
                    debug!("module {} already completed, no XP awarded", module_id);
                    continue;
                }
                let reward = xp_reward_for_module(module_id);
                awards.0.push(XpAward {
                    amount: reward,
                    source: XpSource::Module(module_id),
                });
                quest_events.0.push((QuestType::Module, 1));
                effects.0.push(Effect::SaveCompleted(progress.sorted()));
                effects.0.push(Effect::PushCompletion(module_id));
                events
                    .0
                    .push(format!("Module {} completed (+{} XP)", module_id, reward));
            }
            LearnerAction::ResetProgress => {
                progress.clear();
                effects.0.push(Effect::SaveCompleted(Vec::new()));
                effects.0.push(Effect::DeleteCompletions);
                events.0.push("Progress reset".to_string());
            }
            _ => {}
        }
    }
}
