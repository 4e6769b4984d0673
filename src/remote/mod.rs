pub mod client;
pub mod memory;

pub use client::{
    RemoteError, RemoteProgressClient, StatsFeed, StatsUpdate, UserStatsRow,
};
pub use memory::InMemoryRemote;
