use bevy_ecs::prelude::*;
use tracing::{debug, warn};

use crate::core::session::{ActionQueue, ActiveUser, Effect, EffectQueue, LearnerAction};
use crate::progress::stats::UserStats;
use crate::rules::level::level_for_xp;

#[derive(Debug, Clone)]
pub enum XpSource {
    Module(u32),
    Quest(String),
    Direct,
}

#[derive(Debug, Clone)]
pub struct XpAward {
    pub amount: u32,
    pub source: XpSource,
}

/// Resource accumulating the XP awards of the current tick.
#[derive(Resource, Default, Debug)]
pub struct XpAwardLog(pub Vec<XpAward>);

/// System: validates direct XP gains and accrues them as awards. Zero
/// amounts are a caller bug and are rejected, not clamped.
pub fn direct_xp_system(queue: Res<ActionQueue>, mut awards: ResMut<XpAwardLog>) {
    for action in &queue.0 {
        if let LearnerAction::GainXp { amount } = action {
            if *amount == 0 {
                warn!("rejecting XP gain of 0");
                continue;
            }
            awards.0.push(XpAward {
                amount: *amount,
                source: XpSource::Direct,
            });
        }
    }
}

/// System: commits the tick's XP awards as a single remote stats write.
///
/// No optimistic local update happens here: the displayed value moves when
/// the stats feed pushes the row back. The level field rides along only
/// when it increased, so a partial write can never downgrade the stored
/// level. With no signed-in user the accrual is silently dropped (guest
/// mode is local-only).
pub fn xp_commit_system(
    queue: Res<ActionQueue>,
    user: Res<ActiveUser>,
    mut stats: ResMut<UserStats>,
    mut awards: ResMut<XpAwardLog>,
    mut effects: ResMut<EffectQueue>,
) {
    for action in &queue.0 {
        if matches!(action, LearnerAction::AcknowledgeLevelUp) {
            stats.acknowledge_level_up();
        }
    }

    let drained = std::mem::take(&mut awards.0);
    let total: u32 = drained.iter().map(|award| award.amount).sum();
    if total == 0 {
        return;
    }
    if user.0.is_none() {
        debug!("guest session, dropping {} XP", total);
        return;
    }

    let new_xp = stats.xp.saturating_add(total);
    let new_level = level_for_xp(new_xp);
    let level = (new_level > stats.level).then_some(new_level);
    effects.0.push(Effect::WriteStats { xp: new_xp, level });
}
