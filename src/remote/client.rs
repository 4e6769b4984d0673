use std::sync::mpsc::Receiver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the hosted per-user stats table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatsRow {
    pub user_id: String,
    pub xp: u32,
    pub level: u32,
    pub current_streak: u32,
    pub last_activity: Option<DateTime<Utc>>,
}

impl UserStatsRow {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            xp: 0,
            level: 1,
            current_streak: 0,
            last_activity: None,
        }
    }
}

/// The exact set of stats fields a client write may touch. `level` is
/// carried only when it increased, so a partial write can never downgrade
/// the stored level.
#[derive(Debug, Clone)]
pub struct StatsUpdate {
    pub xp: u32,
    pub level: Option<u32>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug)]
pub enum RemoteError {
    /// Uniqueness violation on the completion table. Benign for callers:
    /// the record already exists, so the state is consistent.
    DuplicateKey,
    Backend(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::DuplicateKey => write!(f, "duplicate key"),
            RemoteError::Backend(message) => write!(f, "backend error: {}", message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Handle for a standing subscription to one user's stats row. Rows arrive
/// on the channel as the backend applies writes; the owner drains it
/// non-blockingly and must hand the handle back to the client to cancel.
#[derive(Debug)]
pub struct StatsFeed {
    id: u64,
    user_id: String,
    receiver: Receiver<UserStatsRow>,
}

impl StatsFeed {
    pub fn new(id: u64, user_id: &str, receiver: Receiver<UserStatsRow>) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            receiver,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Pending rows, without blocking.
    pub fn drain(&self) -> Vec<UserStatsRow> {
        self.receiver.try_iter().collect()
    }
}

/// The hosted progress backend: a per-user stats row with a real-time
/// change feed, plus an append-only table of module completions.
pub trait RemoteProgressClient {
    fn fetch_stats(&self, user_id: &str) -> Result<UserStatsRow, RemoteError>;
    fn update_stats(&mut self, user_id: &str, update: &StatsUpdate) -> Result<(), RemoteError>;
    fn list_completed(&self, user_id: &str) -> Result<Vec<u32>, RemoteError>;
    fn insert_completion(&mut self, user_id: &str, module_id: u32) -> Result<(), RemoteError>;
    fn delete_completions(&mut self, user_id: &str) -> Result<(), RemoteError>;
    fn subscribe_stats(&mut self, user_id: &str) -> StatsFeed;
    fn unsubscribe(&mut self, feed: StatsFeed);
}
