//! Calendar events rendered from race records.
//!
//! [`CalendarEvent`] is the only shape that crosses the calendar port. Its
//! `id` is the [`RaceId`] of the record it was rendered from, which is what
//! lets reconciliation match calendar entries back to storage.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::RaceId;
use crate::race_type::{RaceFamily, RaceType};
use crate::record::RaceRecord;
use crate::time::local_to_utc;

/// How long a race occupies on the calendar.
pub const EVENT_DURATION_MINUTES: i64 = 10;

/// A calendar entry for one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Identity of the race this event mirrors.
    pub id: RaceId,
    /// Race type tag, stored alongside the id by calendar backends.
    pub race_type: RaceType,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub description: String,
}

impl CalendarEvent {
    /// Creates an event with the default duration and no location or description.
    pub fn new(id: RaceId, summary: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            race_type: id.race_type(),
            id,
            summary: summary.into(),
            start,
            end: start + Duration::minutes(EVENT_DURATION_MINUTES),
            location: String::new(),
            description: String::new(),
        }
    }

    /// Renders the calendar entry for a record.
    pub fn from_record(record: &RaceRecord) -> Self {
        let race_type = record.race_type();
        let mut summary = format!("[{}] {}", record.grade(), record.name());
        if let Some(stage) = record.stage() {
            summary.push(' ');
            summary.push_str(stage);
        }

        Self::new(record.id().clone(), summary, local_to_utc(record.date_time()))
            .with_location(format!("{}{}", record.location(), race_type.venue_suffix()))
            .with_description(describe(record))
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &RaceId {
        &self.id
    }

    /// Returns the event's duration.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

fn describe(record: &RaceRecord) -> String {
    let race_type = record.race_type();
    let mut out = format!(
        "{} {}{}R\nグレード: {}",
        race_type.display_name(),
        record.location(),
        record.race_number(),
        record.grade()
    );

    match race_type.family() {
        RaceFamily::Horse => {
            if let Some(held) = record.held() {
                let _ = write!(
                    out,
                    "\n開催: {}回{}{}日",
                    held.held_times,
                    record.location(),
                    held.held_day_times
                );
            }
            if let Some(condition) = record.condition() {
                let _ = write!(out, "\nコース: {}{}m", condition.surface.display_name(), condition.distance);
            }
        }
        RaceFamily::Mechanical => {
            if let Some(stage) = record.stage() {
                let _ = write!(out, "\nステージ: {stage}");
            }
            let participants = record.participants();
            if !participants.is_empty() {
                let _ = write!(out, "\n出走: {}名", participants.len());
            }
        }
    }

    let _ = write!(out, "\nID: {}", record.id());
    out
}
