//! Time windows for sync queries.
//!
//! Race start times are local wall-clock times (Japan time for every
//! discipline, overseas races included, as published by the sources).
//! [`TimeWindow`] holds a half-open UTC range and converts to and from local
//! calendar dates.

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// The fixed offset race schedules are published in.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("valid offset")
}

/// Interprets a local race time as JST and converts it to UTC.
pub fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    // A fixed offset has no gaps or folds, so the mapping is always single.
    (local - Duration::seconds(JST_OFFSET_SECS.into())).and_utc()
}

fn local_midnight(day: NaiveDate) -> Option<DateTime<Utc>> {
    let utc = day
        .and_hms_opt(0, 0, 0)?
        .checked_sub_signed(Duration::seconds(JST_OFFSET_SECS.into()))?;
    Some(utc.and_utc())
}

/// A time window for querying races and calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a window covering `days` whole local (JST) days from `first_day`.
    ///
    /// # Panics
    ///
    /// Panics if the window does not fit in chrono's date range. Use
    /// [`TimeWindow::checked_local_days`] for dates that come from user input.
    pub fn for_local_days(first_day: NaiveDate, days: u32) -> Self {
        Self::checked_local_days(first_day, days).expect("window within the supported date range")
    }

    /// Like [`TimeWindow::for_local_days`], but returns `None` when either
    /// end of the window falls outside chrono's date range.
    pub fn checked_local_days(first_day: NaiveDate, days: u32) -> Option<Self> {
        let end_day = first_day.checked_add_days(Days::new(days.into()))?;
        Some(Self::new(local_midnight(first_day)?, local_midnight(end_day)?))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if a local race time falls within this window.
    pub fn contains_local(&self, local: NaiveDateTime) -> bool {
        self.contains(local_to_utc(local))
    }

    /// Returns every local date touched by this window, in order.
    pub fn local_dates(&self) -> Vec<NaiveDate> {
        let first = self.start.with_timezone(&jst()).date_naive();
        let last = if self.end > self.start {
            (self.end - Duration::nanoseconds(1)).with_timezone(&jst()).date_naive()
        } else {
            return Vec::new();
        };
        first.iter_days().take_while(|d| *d <= last).collect()
    }
}
