//! Persisted daily event counter.
//!
//! One record keyed by ISO date, read at startup and rewritten synchronously
//! on every confirmed event. The deliberate small blocking disk write on the
//! registration step is acceptable because events are rare (sub-Hz) relative
//! to the sampling rate. Corrupt/missing files are non-fatal (count 0); the
//! date rolls over lazily at read time, not on a timer.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use contracts::ContractError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedCounter {
    date: NaiveDate,
    event_count: u64,
}

/// Daily event counter with lazy date rollover.
#[derive(Debug)]
pub struct DailyCounter {
    path: PathBuf,
    date: NaiveDate,
    count: u64,
}

impl DailyCounter {
    /// Load the counter from `path`.
    ///
    /// A missing or corrupt file falls back to zero for today, logged but
    /// never fatal.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let today = Self::today();

        let persisted = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<PersistedCounter>(&content).ok());

        let (date, count) = match persisted {
            Some(record) => {
                debug!(
                    path = %path.display(),
                    date = %record.date,
                    count = record.event_count,
                    "daily counter loaded"
                );
                (record.date, record.event_count)
            }
            None => {
                warn!(
                    path = %path.display(),
                    "daily counter missing or unreadable, starting at 0"
                );
                (today, 0)
            }
        };

        Self { path, date, count }
    }

    /// Today's confirmed event count.
    ///
    /// Rolls the stored date over implicitly when it no longer matches
    /// today.
    pub fn count(&mut self) -> u64 {
        self.rollover_if_stale();
        self.count
    }

    /// Record one confirmed event: increment, persist synchronously.
    ///
    /// Persistence failure is logged and the in-memory count continues.
    pub fn register_event(&mut self) -> u64 {
        self.rollover_if_stale();
        self.count += 1;

        if let Err(e) = self.persist() {
            warn!(
                path = %self.path.display(),
                error = %e,
                "daily counter persist failed, continuing in memory"
            );
        }
        self.count
    }

    /// Counter file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rollover_if_stale(&mut self) {
        let today = Self::today();
        if self.date != today {
            debug!(
                old_date = %self.date,
                new_date = %today,
                "daily counter rolled over"
            );
            self.date = today;
            self.count = 0;
        }
    }

    fn persist(&self) -> Result<(), ContractError> {
        let record = PersistedCounter {
            date: self.date,
            event_count: self.count,
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| ContractError::counter_persist(self.path.display().to_string(), e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| ContractError::counter_persist(self.path.display().to_string(), e.to_string()))?;
        Ok(())
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_starts_at_zero() {
        let dir = tempdir().unwrap();
        let mut counter = DailyCounter::load(dir.path().join("events.json"));
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn corrupt_file_is_non_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "not json {{{").unwrap();

        let mut counter = DailyCounter::load(&path);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn register_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");

        let mut counter = DailyCounter::load(&path);
        assert_eq!(counter.register_event(), 1);
        assert_eq!(counter.register_event(), 2);

        let mut reloaded = DailyCounter::load(&path);
        assert_eq!(reloaded.count(), 2);
    }

    #[test]
    fn stale_date_rolls_over_to_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");

        let record = PersistedCounter {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            event_count: 7,
        };
        fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();

        let mut counter = DailyCounter::load(&path);
        // Stored count belongs to an old day
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.register_event(), 1);
    }

    #[test]
    fn persist_failure_keeps_in_memory_count() {
        let dir = tempdir().unwrap();
        // Path is a directory: writes fail, counting continues
        let mut counter = DailyCounter::load(dir.path());
        assert_eq!(counter.register_event(), 1);
        assert_eq!(counter.register_event(), 2);
        assert_eq!(counter.count(), 2);
    }
}
