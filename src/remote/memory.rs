use std::collections::{BTreeSet, HashMap};
use std::sync::mpsc::{channel, Sender};

use crate::remote::client::{
    RemoteError, RemoteProgressClient, StatsFeed, StatsUpdate, UserStatsRow,
};
use crate::rules::level::level_for_xp;

/// In-memory stand-in for the hosted progress backend. Used by the demo
/// binary and tests. The stored level is always recomputed from xp on
/// write, so the server side stays authoritative for level.
#[derive(Default)]
pub struct InMemoryRemote {
    stats: HashMap<String, UserStatsRow>,
    completions: HashMap<String, BTreeSet<u32>>,
    subscribers: Vec<(u64, String, Sender<UserStatsRow>)>,
    next_feed_id: u64,
    /// When set, every call fails with a backend error. For failure-path
    /// tests.
    pub offline: bool,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_stats(&mut self, row: UserStatsRow) {
        self.stats.insert(row.user_id.clone(), row);
    }

    pub fn seed_completions(&mut self, user_id: &str, modules: &[u32]) {
        self.completions
            .entry(user_id.to_string())
            .or_default()
            .extend(modules.iter().copied());
    }

    pub fn completion_count(&self, user_id: &str) -> usize {
        self.completions
            .get(user_id)
            .map(|set| set.len())
            .unwrap_or(0)
    }

    pub fn stored_stats(&self, user_id: &str) -> Option<&UserStatsRow> {
        self.stats.get(user_id)
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline {
            Err(RemoteError::Backend("service unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn notify(&mut self, user_id: &str) {
        let Some(row) = self.stats.get(user_id).cloned() else {
            return;
        };
        self.subscribers
            .retain(|(_, subscribed, sender)| {
                subscribed != user_id || sender.send(row.clone()).is_ok()
            });
    }
}

impl RemoteProgressClient for InMemoryRemote {
    fn fetch_stats(&self, user_id: &str) -> Result<UserStatsRow, RemoteError> {
        self.check_online()?;
        Ok(self
            .stats
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserStatsRow::new(user_id)))
    }

    fn update_stats(&mut self, user_id: &str, update: &StatsUpdate) -> Result<(), RemoteError> {
        self.check_online()?;
        let row = self
            .stats
            .entry(user_id.to_string())
            .or_insert_with(|| UserStatsRow::new(user_id));
        row.xp = update.xp;
        // The client may hint a raised level; the stored value is always
        // derived from xp so the two can never drift apart.
        row.level = level_for_xp(row.xp);
        row.last_activity = Some(update.last_activity);
        self.notify(user_id);
        Ok(())
    }

    fn list_completed(&self, user_id: &str) -> Result<Vec<u32>, RemoteError> {
        self.check_online()?;
        Ok(self
            .completions
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn insert_completion(&mut self, user_id: &str, module_id: u32) -> Result<(), RemoteError> {
        self.check_online()?;
        let set = self.completions.entry(user_id.to_string()).or_default();
        if !set.insert(module_id) {
            return Err(RemoteError::DuplicateKey);
        }
        Ok(())
    }

    fn delete_completions(&mut self, user_id: &str) -> Result<(), RemoteError> {
        self.check_online()?;
        self.completions.remove(user_id);
        Ok(())
    }

    fn subscribe_stats(&mut self, user_id: &str) -> StatsFeed {
        let (sender, receiver) = channel();
        self.next_feed_id += 1;
        let id = self.next_feed_id;
        self.subscribers.push((id, user_id.to_string(), sender));
        StatsFeed::new(id, user_id, receiver)
    }

    fn unsubscribe(&mut self, feed: StatsFeed) {
        self.subscribers.retain(|(id, _, _)| *id != feed.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn update(xp: u32, level: Option<u32>) -> StatsUpdate {
        StatsUpdate {
            xp,
            level,
            last_activity: Utc::now(),
        }
    }

    #[test]
    fn duplicate_completion_insert_is_rejected() {
        let mut remote = InMemoryRemote::new();
        remote.insert_completion("u1", 3).unwrap();
        assert!(matches!(
            remote.insert_completion("u1", 3),
            Err(RemoteError::DuplicateKey)
        ));
        assert_eq!(remote.completion_count("u1"), 1);
    }

    #[test]
    fn stored_level_is_recomputed_from_xp() {
        let mut remote = InMemoryRemote::new();
        remote.update_stats("u1", &update(200, None)).unwrap();
        assert_eq!(remote.stored_stats("u1").unwrap().level, 3);
        // A stale low hint cannot downgrade the derived level.
        remote.update_stats("u1", &update(450, Some(2))).unwrap();
        assert_eq!(remote.stored_stats("u1").unwrap().level, 4);
    }

    #[test]
    fn subscription_delivers_only_matching_user_rows() {
        let mut remote = InMemoryRemote::new();
        let feed = remote.subscribe_stats("u1");
        remote.update_stats("u2", &update(50, None)).unwrap();
        assert!(feed.drain().is_empty());
        remote.update_stats("u1", &update(50, None)).unwrap();
        let rows = feed.drain();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].xp, 50);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut remote = InMemoryRemote::new();
        let feed = remote.subscribe_stats("u1");
        remote.unsubscribe(feed);
        remote.update_stats("u1", &update(10, None)).unwrap();
        assert!(remote.subscribers.is_empty());
    }

    #[test]
    fn offline_toggle_fails_every_call() {
        let mut remote = InMemoryRemote::new();
        remote.offline = true;
        assert!(remote.fetch_stats("u1").is_err());
        assert!(remote.list_completed("u1").is_err());
        assert!(remote.insert_completion("u1", 1).is_err());
    }
}
