use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{UserId, log};
use super::{GameOutcome, StatsCounters, StatsError, StatsStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StatsData {
    #[serde(default)]
    users: BTreeMap<UserId, StatsCounters>,
}

/// Keeps every user's counters in one YAML file, rewritten after each change.
pub struct FileStatsStore {
    file_path: PathBuf,
    io_lock: Mutex<()>,
}

impl FileStatsStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            io_lock: Mutex::new(()),
        }
    }

    fn read_data(&self) -> Result<StatsData, StatsError> {
        let content = match std::fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StatsData::default()),
            Err(source) => {
                return Err(StatsError::Io {
                    operation: "read",
                    source,
                });
            }
        };

        match serde_yaml_ng::from_str::<Option<StatsData>>(&content) {
            Ok(data) => Ok(data.unwrap_or_default()),
            Err(e) => {
                log!(
                    "Stats file {} is corrupt ({}), starting from empty stats",
                    self.file_path.display(),
                    e
                );
                let data = StatsData::default();
                self.write_data(&data)?;
                Ok(data)
            }
        }
    }

    fn write_data(&self, data: &StatsData) -> Result<(), StatsError> {
        let content = serde_yaml_ng::to_string(data)?;
        std::fs::write(&self.file_path, content).map_err(|source| StatsError::Io {
            operation: "write",
            source,
        })
    }

    fn update<F>(&self, user: &UserId, apply: F) -> Result<StatsCounters, StatsError>
    where
        F: FnOnce(&mut StatsCounters),
    {
        let _guard = self.io_lock.lock().map_err(|_| StatsError::LockPoisoned)?;
        let mut data = self.read_data()?;
        let counters = data.users.entry(user.clone()).or_default();
        apply(counters);
        let result = *counters;
        self.write_data(&data)?;
        Ok(result)
    }
}

impl StatsStore for FileStatsStore {
    fn get_stats(&self, user: &UserId) -> Result<StatsCounters, StatsError> {
        let _guard = self.io_lock.lock().map_err(|_| StatsError::LockPoisoned)?;
        let data = self.read_data()?;
        Ok(data.users.get(user).copied().unwrap_or_default())
    }

    fn increment(&self, user: &UserId, outcome: GameOutcome) -> Result<StatsCounters, StatsError> {
        self.update(user, |counters| counters.record(outcome))
    }

    fn reset(&self, user: &UserId) -> Result<StatsCounters, StatsError> {
        self.update(user, |counters| *counters = StatsCounters::default())
    }
}
