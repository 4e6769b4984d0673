use bevy_ecs::prelude::*;
use chrono::{Local, Utc};
use tracing::{debug, warn};

use crate::core::ecs::{create_schedule, create_world};
use crate::persistence::ProgressStore;
use crate::progress::quests::{Quest, QuestBundle, QuestLog};
use crate::progress::stats::UserStats;
use crate::progress::tracker::ModuleProgress;
use crate::remote::{RemoteError, RemoteProgressClient, StatsFeed, StatsUpdate};

/// Intent-driven commands fed into the ECS each tick.
#[derive(Debug, Clone)]
pub enum LearnerAction {
    CompleteModule { module_id: u32 },
    GainXp { amount: u32 },
    RecordLogin,
    AcknowledgeLevelUp,
    ResetProgress,
}

/// Resource storing the actions for the next tick.
#[derive(Resource, Default, Debug)]
pub struct ActionQueue(pub Vec<LearnerAction>);

/// Deferred I/O requested by systems. Executed by the session after the
/// schedule runs, in queue order, so local saves always land before the
/// remote calls queued behind them.
#[derive(Debug, Clone)]
pub enum Effect {
    SaveCompleted(Vec<u32>),
    SaveQuests(QuestBundle),
    WriteStats { xp: u32, level: Option<u32> },
    PushCompletion(u32),
    DeleteCompletions,
}

#[derive(Resource, Default, Debug)]
pub struct EffectQueue(pub Vec<Effect>);

/// The signed-in user id, if any. `None` is guest mode: progress stays
/// local and XP accrual is a no-op.
#[derive(Resource, Default, Debug)]
pub struct ActiveUser(pub Option<String>);

/// Today's local calendar date as a `YYYY-MM-DD` string, refreshed by the
/// session before each tick. Quest rollover compares against it.
#[derive(Resource, Default, Debug)]
pub struct Today(pub String);

/// Resource capturing human-readable progress events for the UI layer.
#[derive(Resource, Default, Debug)]
pub struct ProgressEventLog(pub Vec<String>);

/// Data snapshot returned to the UI layer after each tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub xp: u32,
    pub level: u32,
    pub current_streak: u32,
    pub loading: bool,
    pub pending_level_up: Option<u32>,
    pub completed_modules: Vec<u32>,
    pub quests: Vec<Quest>,
    pub events: Vec<String>,
}

impl Snapshot {
    fn capture(world: &mut World) -> Self {
        let stats = world.resource::<UserStats>().clone();
        let completed_modules = world.resource::<ModuleProgress>().sorted();
        let quests = world.resource::<QuestLog>().bundle.quests.clone();
        let events = std::mem::take(&mut world.resource_mut::<ProgressEventLog>().0);
        Self {
            xp: stats.xp,
            level: stats.level,
            current_streak: stats.current_streak,
            loading: stats.loading,
            pending_level_up: stats.pending_level_up(),
            completed_modules,
            quests,
            events,
        }
    }
}

/// Wrapper around the ECS world and schedule, owning all I/O: the local
/// store, the remote client, and the standing stats feed.
pub struct Session {
    world: World,
    schedule: Schedule,
    store: Box<dyn ProgressStore>,
    remote: Box<dyn RemoteProgressClient>,
    feed: Option<StatsFeed>,
    user_id: Option<String>,
}

impl Session {
    /// Create a session with the completion set and quest bundle loaded
    /// from local storage. Read failures fall back to empty state.
    pub fn new(store: Box<dyn ProgressStore>, remote: Box<dyn RemoteProgressClient>) -> Self {
        let mut world = create_world();

        match store.load_completed() {
            Ok(modules) => {
                *world.resource_mut::<ModuleProgress>() = ModuleProgress::from_modules(modules);
            }
            Err(err) => {
                warn!("failed to load completed modules, starting empty: {}", err);
            }
        }
        match store.load_quests() {
            Ok(Some(bundle)) => {
                world.resource_mut::<QuestLog>().bundle = bundle;
            }
            Ok(None) => {}
            Err(err) => {
                warn!("failed to load daily quests, regenerating: {}", err);
            }
        }

        Self {
            world,
            schedule: create_schedule(),
            store,
            remote,
            feed: None,
            user_id: None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Switch the session to an authenticated user: load their stats,
    /// open the stats feed, and run the once-per-session completion merge.
    pub fn sign_in(&mut self, user_id: &str) {
        self.sign_out();
        self.user_id = Some(user_id.to_string());
        self.world.resource_mut::<ActiveUser>().0 = Some(user_id.to_string());

        self.world.resource_mut::<UserStats>().loading = true;
        match self.remote.fetch_stats(user_id) {
            Ok(row) => {
                self.world.resource_mut::<UserStats>().load_initial(&row);
            }
            Err(err) => {
                warn!("failed to load stats for {}: {}", user_id, err);
                *self.world.resource_mut::<UserStats>() = UserStats::default();
            }
        }

        self.feed = Some(self.remote.subscribe_stats(user_id));
        self.merge_remote_completions(user_id);
    }

    /// Tear down the user context: cancel the stats feed and drop the
    /// session stats. The completion set stays, it is device-local.
    pub fn sign_out(&mut self) {
        if let Some(feed) = self.feed.take() {
            self.remote.unsubscribe(feed);
        }
        self.user_id = None;
        self.world.resource_mut::<ActiveUser>().0 = None;
        *self.world.resource_mut::<UserStats>() = UserStats::default();
    }

    /// Run one tick with the provided actions and return a snapshot for
    /// rendering.
    pub fn tick(&mut self, actions: Vec<LearnerAction>) -> Snapshot {
        self.world.resource_mut::<Today>().0 = today_string();
        self.world.resource_mut::<ActionQueue>().0.extend(actions);
        self.schedule.run(&mut self.world);
        self.run_effects();
        self.pump_feed();
        Snapshot::capture(&mut self.world)
    }

    pub fn complete_module(&mut self, module_id: u32) -> Snapshot {
        self.tick(vec![LearnerAction::CompleteModule { module_id }])
    }

    pub fn add_xp(&mut self, amount: u32) -> Snapshot {
        self.tick(vec![LearnerAction::GainXp { amount }])
    }

    pub fn record_login(&mut self) -> Snapshot {
        self.tick(vec![LearnerAction::RecordLogin])
    }

    pub fn acknowledge_level_up(&mut self) -> Snapshot {
        self.tick(vec![LearnerAction::AcknowledgeLevelUp])
    }

    pub fn reset_progress(&mut self) -> Snapshot {
        self.tick(vec![LearnerAction::ResetProgress])
    }

    /// Pure lock query for the UI: module 1 is always open, later modules
    /// require their predecessor.
    pub fn is_module_locked(&self, module_id: u32) -> bool {
        self.world.resource::<ModuleProgress>().is_locked(module_id)
    }

    fn run_effects(&mut self) {
        let effects = std::mem::take(&mut self.world.resource_mut::<EffectQueue>().0);
        for effect in effects {
            match effect {
                Effect::SaveCompleted(modules) => {
                    if let Err(err) = self.store.save_completed(&modules) {
                        warn!("failed to persist completed modules: {}", err);
                    }
                }
                Effect::SaveQuests(bundle) => {
                    if let Err(err) = self.store.save_quests(&bundle) {
                        warn!("failed to persist daily quests: {}", err);
                    }
                }
                Effect::WriteStats { xp, level } => {
                    let Some(user_id) = self.user_id.clone() else {
                        continue;
                    };
                    let update = StatsUpdate {
                        xp,
                        level,
                        last_activity: Utc::now(),
                    };
                    if let Err(err) = self.remote.update_stats(&user_id, &update) {
                        warn!("stats write for {} failed: {}", user_id, err);
                    }
                }
                Effect::PushCompletion(module_id) => {
                    let Some(user_id) = self.user_id.clone() else {
                        continue;
                    };
                    match self.remote.insert_completion(&user_id, module_id) {
                        Ok(()) => {}
                        Err(RemoteError::DuplicateKey) => {
                            debug!("completion {} already recorded for {}", module_id, user_id);
                        }
                        Err(err) => {
                            warn!("completion push for {} failed: {}", user_id, err);
                        }
                    }
                }
                Effect::DeleteCompletions => {
                    let Some(user_id) = self.user_id.clone() else {
                        continue;
                    };
                    if let Err(err) = self.remote.delete_completions(&user_id) {
                        warn!("remote reset for {} failed: {}", user_id, err);
                    }
                }
            }
        }
    }

    /// Drain the stats feed and apply pushed rows wholesale. This is the
    /// only path that moves displayed xp/level after a write.
    fn pump_feed(&mut self) {
        let Some(feed) = &self.feed else {
            return;
        };
        let rows = feed.drain();
        if rows.is_empty() {
            return;
        }
        let mut stats = self.world.resource_mut::<UserStats>();
        for row in rows {
            stats.apply_remote_row(&row);
        }
    }

    fn merge_remote_completions(&mut self, user_id: &str) {
        let remote_modules = match self.remote.list_completed(user_id) {
            Ok(modules) => modules,
            Err(err) => {
                warn!(
                    "failed to fetch remote completions for {}, keeping local set: {}",
                    user_id, err
                );
                return;
            }
        };

        let outcome = self
            .world
            .resource_mut::<ModuleProgress>()
            .merge_remote(&remote_modules);
        let merged = self.world.resource::<ModuleProgress>().sorted();
        if let Err(err) = self.store.save_completed(&merged) {
            warn!("failed to persist merged completions: {}", err);
        }
        for module_id in outcome.to_upload {
            match self.remote.insert_completion(user_id, module_id) {
                Ok(()) => {}
                Err(RemoteError::DuplicateKey) => {
                    debug!("completion {} already recorded for {}", module_id, user_id);
                }
                Err(err) => {
                    warn!("completion push for {} failed: {}", user_id, err);
                }
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.take() {
            self.remote.unsubscribe(feed);
        }
    }
}

fn today_string() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::persistence::MemoryStore;
    use crate::progress::quests::QuestType;
    use crate::remote::{InMemoryRemote, UserStatsRow};

    /// Test handle that lets assertions inspect the remote after the
    /// session has taken ownership of a client.
    #[derive(Clone)]
    struct SharedRemote(Rc<RefCell<InMemoryRemote>>);

    impl RemoteProgressClient for SharedRemote {
        fn fetch_stats(&self, user_id: &str) -> Result<UserStatsRow, RemoteError> {
            self.0.borrow().fetch_stats(user_id)
        }

        fn update_stats(
            &mut self,
            user_id: &str,
            update: &StatsUpdate,
        ) -> Result<(), RemoteError> {
            self.0.borrow_mut().update_stats(user_id, update)
        }

        fn list_completed(&self, user_id: &str) -> Result<Vec<u32>, RemoteError> {
            self.0.borrow().list_completed(user_id)
        }

        fn insert_completion(&mut self, user_id: &str, module_id: u32) -> Result<(), RemoteError> {
            self.0.borrow_mut().insert_completion(user_id, module_id)
        }

        fn delete_completions(&mut self, user_id: &str) -> Result<(), RemoteError> {
            self.0.borrow_mut().delete_completions(user_id)
        }

        fn subscribe_stats(&mut self, user_id: &str) -> StatsFeed {
            self.0.borrow_mut().subscribe_stats(user_id)
        }

        fn unsubscribe(&mut self, feed: StatsFeed) {
            self.0.borrow_mut().unsubscribe(feed)
        }
    }

    fn session_with(
        store: MemoryStore,
        remote: &Rc<RefCell<InMemoryRemote>>,
    ) -> Session {
        Session::new(Box::new(store), Box::new(SharedRemote(remote.clone())))
    }

    // The daily module quest pays 30 XP on its first completion of the day;
    // tick totals below include it.
    const MODULE_QUEST_XP: u32 = 30;

    #[test]
    fn completing_a_module_twice_awards_xp_once() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);
        session.sign_in("u1");

        let first = session.complete_module(5);
        assert_eq!(first.completed_modules, vec![5]);
        assert_eq!(first.xp, 50 + MODULE_QUEST_XP);

        let second = session.complete_module(5);
        assert_eq!(second.completed_modules, vec![5]);
        assert_eq!(second.xp, 50 + MODULE_QUEST_XP);
        assert_eq!(remote.borrow().completion_count("u1"), 1);
    }

    #[test]
    fn advanced_modules_pay_double_xp() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);
        session.sign_in("u1");

        let snap = session.complete_module(25);
        assert_eq!(snap.xp, 100 + MODULE_QUEST_XP);
    }

    #[test]
    fn guest_completions_stay_local_and_accrue_no_xp() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);

        let snap = session.complete_module(5);
        assert_eq!(snap.completed_modules, vec![5]);
        assert_eq!(snap.xp, 0);
        assert_eq!(snap.level, 1);
        assert_eq!(remote.borrow().completion_count("u1"), 0);
        assert!(remote.borrow().stored_stats("u1").is_none());
    }

    #[test]
    fn level_up_signal_is_consumed_exactly_once() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);
        session.sign_in("u1");

        let snap = session.add_xp(60);
        assert_eq!(snap.xp, 60);
        assert_eq!(snap.level, 2);
        assert_eq!(snap.pending_level_up, Some(2));

        let acked = session.acknowledge_level_up();
        assert_eq!(acked.pending_level_up, None);
    }

    #[test]
    fn xp_quest_completes_and_rewards_once() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);
        session.sign_in("u1");

        let first = session.add_xp(60);
        let xp_quest = first
            .quests
            .iter()
            .find(|quest| quest.quest_type == QuestType::Xp)
            .unwrap()
            .clone();
        assert_eq!(xp_quest.progress, 60);
        assert!(!xp_quest.completed);

        // Second gain crosses the 100 XP goal: 60 + 60 + 25 reward.
        let second = session.add_xp(60);
        let xp_quest = second
            .quests
            .iter()
            .find(|quest| quest.quest_type == QuestType::Xp)
            .unwrap()
            .clone();
        assert_eq!(xp_quest.progress, xp_quest.goal);
        assert!(xp_quest.completed);
        assert_eq!(second.xp, 60 + 60 + 25);

        // No re-award once completed.
        let third = session.add_xp(10);
        assert_eq!(third.xp, 60 + 60 + 25 + 10);
    }

    #[test]
    fn zero_xp_gains_are_rejected() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);
        session.sign_in("u1");

        let snap = session.add_xp(0);
        assert_eq!(snap.xp, 0);
        assert!(remote.borrow().stored_stats("u1").is_none());
    }

    #[test]
    fn sign_in_merges_local_and_remote_completions() {
        let mut store = MemoryStore::new();
        store.save_completed(&[1, 2, 5]).unwrap();
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        remote.borrow_mut().seed_completions("u1", &[1, 2, 3]);

        let mut session = session_with(store, &remote);
        session.sign_in("u1");

        let snap = session.tick(Vec::new());
        assert_eq!(snap.completed_modules, vec![1, 2, 3, 5]);
        // Both asymmetric entries were pushed; the duplicate was benign.
        assert_eq!(remote.borrow().completion_count("u1"), 4);
    }

    #[test]
    fn sign_in_survives_an_offline_remote() {
        let mut store = MemoryStore::new();
        store.save_completed(&[1]).unwrap();
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        remote.borrow_mut().offline = true;

        let mut session = session_with(store, &remote);
        session.sign_in("u1");

        let snap = session.tick(Vec::new());
        assert_eq!(snap.xp, 0);
        assert_eq!(snap.level, 1);
        assert_eq!(snap.completed_modules, vec![1]);
    }

    #[test]
    fn sign_in_does_not_raise_the_level_up_signal() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        remote.borrow_mut().seed_stats(UserStatsRow {
            user_id: "u1".to_string(),
            xp: 450,
            level: 4,
            current_streak: 7,
            last_activity: None,
        });

        let mut session = session_with(MemoryStore::new(), &remote);
        session.sign_in("u1");

        let snap = session.tick(Vec::new());
        assert_eq!(snap.level, 4);
        assert_eq!(snap.current_streak, 7);
        assert_eq!(snap.pending_level_up, None);
    }

    #[test]
    fn reset_clears_local_and_remote_progress() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);
        session.sign_in("u1");

        session.complete_module(1);
        session.complete_module(2);
        assert_eq!(remote.borrow().completion_count("u1"), 2);

        let snap = session.reset_progress();
        assert!(snap.completed_modules.is_empty());
        assert_eq!(remote.borrow().completion_count("u1"), 0);
    }

    #[test]
    fn stale_quest_bundle_is_regenerated_on_the_next_tick() {
        let mut store = MemoryStore::new();
        let mut old = crate::data::quest_templates::generate_daily_quests("2020-01-01");
        old.apply_progress(QuestType::Xp, 50);
        store.save_quests(&old).unwrap();

        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(store, &remote);
        let snap = session.tick(Vec::new());

        let xp_quest = snap
            .quests
            .iter()
            .find(|quest| quest.quest_type == QuestType::Xp)
            .unwrap();
        assert_eq!(xp_quest.progress, 0);
        let login = snap
            .quests
            .iter()
            .find(|quest| quest.quest_type == QuestType::Login)
            .unwrap();
        assert!(login.completed);
    }

    #[test]
    fn lock_order_is_strictly_linear() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);

        assert!(!session.is_module_locked(1));
        assert!(session.is_module_locked(2));
        session.complete_module(1);
        assert!(!session.is_module_locked(2));
        assert!(session.is_module_locked(3));
    }

    #[test]
    fn sign_out_tears_down_the_feed_and_resets_stats() {
        let remote = Rc::new(RefCell::new(InMemoryRemote::new()));
        let mut session = session_with(MemoryStore::new(), &remote);
        session.sign_in("u1");
        session.add_xp(60);

        session.sign_out();
        let snap = session.tick(Vec::new());
        assert_eq!(snap.xp, 0);
        assert_eq!(snap.level, 1);
        assert!(session.user_id().is_none());
    }
}
