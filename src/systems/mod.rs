pub mod completion;
pub mod gamification;
pub mod quests;

use bevy_ecs::prelude::*;

use crate::core::session::ActionQueue;

/// System: drops the processed actions at the end of the tick.
pub fn clear_action_queue_system(mut queue: ResMut<ActionQueue>) {
    queue.0.clear();
}
