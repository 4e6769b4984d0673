use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;

use crate::core::session::{ActionQueue, ActiveUser, EffectQueue, ProgressEventLog, Today};
use crate::progress::quests::QuestLog;
use crate::progress::stats::UserStats;
use crate::progress::tracker::ModuleProgress;
use crate::systems::clear_action_queue_system;
use crate::systems::completion::module_completion_system;
use crate::systems::gamification::{direct_xp_system, xp_commit_system, XpAwardLog};
use crate::systems::quests::{quest_progress_system, quest_rollover_system, QuestEventQueue};

/// Canonical tick ordering for the progress core.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickSet {
    Intake,
    Progress,
    Quests,
    Gamification,
    Cleanup,
}

/// Build the ECS world with baseline resources.
pub fn create_world() -> World {
    let mut world = World::new();
    world.insert_resource(ActionQueue::default());
    world.insert_resource(EffectQueue::default());
    world.insert_resource(ProgressEventLog::default());
    world.insert_resource(Today::default());
    world.insert_resource(ActiveUser::default());
    world.insert_resource(UserStats::default());
    world.insert_resource(ModuleProgress::default());
    world.insert_resource(QuestLog::default());
    world.insert_resource(XpAwardLog::default());
    world.insert_resource(QuestEventQueue::default());
    world
}

/// Build the system schedule in the canonical order.
pub fn create_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets(
        (
            TickSet::Intake,
            TickSet::Progress,
            TickSet::Quests,
            TickSet::Gamification,
            TickSet::Cleanup,
        )
            .chain(),
    );

    schedule.add_systems((
        quest_rollover_system.in_set(TickSet::Intake),
        module_completion_system.in_set(TickSet::Progress),
        direct_xp_system.in_set(TickSet::Progress),
        quest_progress_system.in_set(TickSet::Quests),
        xp_commit_system.in_set(TickSet::Gamification),
        clear_action_queue_system.in_set(TickSet::Cleanup),
    ));

    schedule
}
