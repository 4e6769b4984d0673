use bevy_ecs::prelude::*;

use crate::remote::UserStatsRow;

/// Session-scoped view of the user's gamification stats. The remote stats
/// feed is the only path that mutates xp/level after sign-in; XP accrual
/// queues a remote write and waits for the push to come back.
#[derive(Resource, Debug, Clone)]
pub struct UserStats {
    pub xp: u32,
    pub level: u32,
    pub current_streak: u32,
    pub loading: bool,
    pending_level_up: Option<u32>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            current_streak: 0,
            loading: false,
            pending_level_up: None,
        }
    }
}

impl UserStats {
    /// Seed stats from the sign-in fetch. Does not raise the level-up
    /// signal: only increases observed during the session count.
    pub fn load_initial(&mut self, row: &UserStatsRow) {
        self.xp = row.xp;
        self.level = row.level.max(1);
        self.current_streak = row.current_streak;
        self.loading = false;
        self.pending_level_up = None;
    }

    /// Replace stats wholesale from a fetched or pushed remote row.
    /// Raises the level-up signal when the incoming level exceeds the
    /// level held so far.
    pub fn apply_remote_row(&mut self, row: &UserStatsRow) {
        if row.level > self.level {
            self.pending_level_up = Some(row.level);
        }
        self.xp = row.xp;
        self.level = row.level;
        self.current_streak = row.current_streak;
        self.loading = false;
    }

    pub fn pending_level_up(&self) -> Option<u32> {
        self.pending_level_up
    }

    /// Consume the level-up signal. Returns the reached level once; any
    /// further call returns None until the next level-up.
    pub fn acknowledge_level_up(&mut self) -> Option<u32> {
        self.pending_level_up.take()
    }
}
