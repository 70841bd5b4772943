use std::time::Duration;

use common::UserId;
use common::stats::{GameOutcome, InMemoryStatsStore, StatsCounters, StatsError, StatsStore};

/// Stats store whose writes block the calling thread, like a slow disk.
pub struct SlowStatsStore {
    inner: InMemoryStatsStore,
    write_delay: Duration,
}

impl SlowStatsStore {
    pub fn new(write_delay: Duration) -> Self {
        Self {
            inner: InMemoryStatsStore::new(),
            write_delay,
        }
    }
}

impl StatsStore for SlowStatsStore {
    fn get_stats(&self, user: &UserId) -> Result<StatsCounters, StatsError> {
        self.inner.get_stats(user)
    }

    fn increment(&self, user: &UserId, outcome: GameOutcome) -> Result<StatsCounters, StatsError> {
        std::thread::sleep(self.write_delay);
        self.inner.increment(user, outcome)
    }

    fn reset(&self, user: &UserId) -> Result<StatsCounters, StatsError> {
        std::thread::sleep(self.write_delay);
        self.inner.reset(user)
    }
}
