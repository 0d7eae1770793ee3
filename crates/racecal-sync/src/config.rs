//! Sync engine configuration.

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use racecal_core::{RaceType, TimeWindow};
use racecal_providers::DEFAULT_BATCH_SIZE;

use crate::error::{SyncError, SyncResult};

/// Longest window a single run may cover.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Settings shared by ingest, sync and the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Race types to process, in order.
    pub race_types: Vec<RaceType>,
    /// Number of local days covered by each run, starting today.
    pub window_days: u32,
    /// Records per storage write.
    pub batch_size: usize,
    /// Pause between storage writes.
    pub batch_pause: Duration,
    /// Pause between successive source calls.
    pub source_fetch_delay: Duration,
    /// Sync race types concurrently instead of one after another.
    pub parallel_race_types: bool,
    /// Compute plans without touching the calendar.
    pub dry_run: bool,
    /// Base interval of the scheduler loop.
    pub sync_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            race_types: RaceType::ALL.to_vec(),
            window_days: 14,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: Duration::from_secs(1),
            source_fetch_delay: Duration::from_secs(1),
            parallel_race_types: false,
            dry_run: false,
            sync_interval: Duration::from_secs(3600),
        }
    }
}

impl SyncConfig {
    pub fn with_race_types(mut self, race_types: impl IntoIterator<Item = RaceType>) -> Self {
        self.race_types = race_types.into_iter().collect();
        self
    }

    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    pub fn with_batching(mut self, batch_size: usize, pause: Duration) -> Self {
        self.batch_size = batch_size;
        self.batch_pause = pause;
        self
    }

    pub fn with_source_fetch_delay(mut self, delay: Duration) -> Self {
        self.source_fetch_delay = delay;
        self
    }

    pub fn with_parallel_race_types(mut self, parallel: bool) -> Self {
        self.parallel_race_types = parallel;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// The window a run starting on `first_day` covers.
    pub fn window_from(&self, first_day: NaiveDate) -> SyncResult<TimeWindow> {
        TimeWindow::checked_local_days(first_day, self.window_days).ok_or_else(|| {
            SyncError::config(format!(
                "a {}-day window starting {first_day} is outside the supported date range",
                self.window_days
            ))
        })
    }

    /// Checks the settings for values no run could use.
    pub fn validate(&self) -> SyncResult<()> {
        if self.race_types.is_empty() {
            return Err(SyncError::config("at least one race type is required"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.race_types.iter().find(|rt| !seen.insert(**rt)) {
            return Err(SyncError::config(format!("race type {dup} listed twice")));
        }
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(SyncError::config(format!(
                "window_days must be in 1..={MAX_WINDOW_DAYS}, got {}",
                self.window_days
            )));
        }
        if self.batch_size == 0 {
            return Err(SyncError::config("batch_size must be at least 1"));
        }
        if self.sync_interval.is_zero() {
            return Err(SyncError::config("sync_interval must be positive"));
        }
        Ok(())
    }
}
