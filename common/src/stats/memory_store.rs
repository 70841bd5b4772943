use std::collections::HashMap;
use std::sync::Mutex;

use crate::UserId;
use super::{GameOutcome, StatsCounters, StatsError, StatsStore};

#[derive(Default)]
pub struct InMemoryStatsStore {
    stats: Mutex<HashMap<UserId, StatsCounters>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsStore for InMemoryStatsStore {
    fn get_stats(&self, user: &UserId) -> Result<StatsCounters, StatsError> {
        let stats = self.stats.lock().map_err(|_| StatsError::LockPoisoned)?;
        Ok(stats.get(user).copied().unwrap_or_default())
    }

    fn increment(&self, user: &UserId, outcome: GameOutcome) -> Result<StatsCounters, StatsError> {
        let mut stats = self.stats.lock().map_err(|_| StatsError::LockPoisoned)?;
        let counters = stats.entry(user.clone()).or_default();
        counters.record(outcome);
        Ok(*counters)
    }

    fn reset(&self, user: &UserId) -> Result<StatsCounters, StatsError> {
        let mut stats = self.stats.lock().map_err(|_| StatsError::LockPoisoned)?;
        stats.insert(user.clone(), StatsCounters::default());
        Ok(StatsCounters::default())
    }
}
