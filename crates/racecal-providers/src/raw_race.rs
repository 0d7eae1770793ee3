//! Raw race rows as a schedule source reports them.
//!
//! A [`RawRace`] keeps the source's own text for every field ("11R",
//! "芝2500m", "5回中山8日") and is turned into a validated
//! [`RaceRecord`](racecal_core::RaceRecord) by
//! [`normalize_race`](crate::normalize::normalize_race).

use chrono::NaiveDate;
use racecal_core::RaceType;
use serde::{Deserialize, Serialize};

/// How the source identifies the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RawVenue {
    /// Venue name, as listed in the venue table.
    Name(String),
    /// Code in the source's display dialect. Never used in identities directly.
    DisplayCode(u8),
}

impl RawVenue {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

/// A competitor row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParticipant {
    /// Position text, e.g. "1" or "1号艇".
    pub position: String,
    pub player_number: String,
}

/// One race as published by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRace {
    pub race_type: RaceType,
    pub name: String,
    pub date: NaiveDate,
    /// Local start time, "HH:MM".
    pub start_time: String,
    pub venue: RawVenue,
    /// Race number text, e.g. "11R".
    pub race_number: String,
    pub grade: String,
    /// Course text, e.g. "芝2500m". Horse racing only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    /// Meeting text, e.g. "5回中山8日". Central horse racing only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held: Option<String>,
    /// Stage text, e.g. "S級決勝". Mechanical racing only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<RawParticipant>,
}

impl RawRace {
    /// Creates a row with the fields every race type shares.
    pub fn new(
        race_type: RaceType,
        name: impl Into<String>,
        date: NaiveDate,
        start_time: impl Into<String>,
        venue: RawVenue,
        race_number: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            race_type,
            name: name.into(),
            date,
            start_time: start_time.into(),
            venue,
            race_number: race_number.into(),
            grade: grade.into(),
            course: None,
            held: None,
            stage: None,
            participants: Vec::new(),
        }
    }

    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course = Some(course.into());
        self
    }

    pub fn with_held(mut self, held: impl Into<String>) -> Self {
        self.held = Some(held.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_participant(mut self, position: impl Into<String>, player_number: impl Into<String>) -> Self {
        self.participants.push(RawParticipant {
            position: position.into(),
            player_number: player_number.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_fixture_row() {
        let json = r#"{
            "race_type": "nar",
            "name": "東京大賞典",
            "date": "2024-12-29",
            "start_time": "16:30",
            "venue": {"type": "display_code", "value": 44},
            "race_number": "10R",
            "grade": "GⅠ",
            "course": "ダート2000m"
        }"#;
        let raw: RawRace = serde_json::from_str(json).unwrap();
        assert_eq!(raw.race_type, RaceType::Nar);
        assert_eq!(raw.venue, RawVenue::DisplayCode(44));
        assert_eq!(raw.course.as_deref(), Some("ダート2000m"));
        assert!(raw.held.is_none());
        assert!(raw.participants.is_empty());
    }

    #[test]
    fn builder_collects_participants() {
        let raw = RawRace::new(
            RaceType::Boatrace,
            "グランプリ",
            NaiveDate::from_ymd_opt(2024, 12, 22).unwrap(),
            "16:35",
            RawVenue::name("住之江"),
            "12R",
            "SG",
        )
        .with_stage("優勝戦")
        .with_participant("1号艇", "4444")
        .with_participant("2号艇", "4320");
        assert_eq!(raw.participants.len(), 2);
        assert_eq!(raw.participants[1].player_number, "4320");
    }
}
