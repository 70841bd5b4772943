mod counters;
mod file_store;
mod memory_store;

pub use counters::{GameOutcome, StatsCounters};
pub use file_store::FileStatsStore;
pub use memory_store::InMemoryStatsStore;

use thiserror::Error;

use crate::UserId;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("failed to {operation} stats file: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize stats: {0}")]
    Serialization(#[from] serde_yaml_ng::Error),

    #[error("stats store lock poisoned")]
    LockPoisoned,
}

/// Durable per-user win/loss/draw counters. Unknown users read as all zeros.
pub trait StatsStore: Send + Sync {
    fn get_stats(&self, user: &UserId) -> Result<StatsCounters, StatsError>;
    fn increment(&self, user: &UserId, outcome: GameOutcome) -> Result<StatsCounters, StatsError>;
    fn reset(&self, user: &UserId) -> Result<StatsCounters, StatsError>;
}
