//! Canonical race records.
//!
//! [`RaceRecord`] is the single record type for every discipline. Fields that
//! only apply to some disciplines are optional, and which ones must be
//! present is decided by the race type:
//!
//! | field          | present for           |
//! |----------------|-----------------------|
//! | `held`         | central horse racing  |
//! | `condition`    | horse-racing family   |
//! | `stage`        | mechanical family     |
//! | `participants` | mechanical family     |
//!
//! Records are immutable once built. An update is a new record with the same
//! [`RaceId`] replacing the old one.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::identity::{self, ParticipantId, RaceId};
use crate::race_type::RaceType;

/// Course surface for horse racing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Turf,
    Dirt,
    Jump,
    /// Synthetic surfaces abroad.
    AllWeather,
}

impl Surface {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Turf => "芝",
            Self::Dirt => "ダート",
            Self::Jump => "障害",
            Self::AllWeather => "オールウェザー",
        }
    }
}

/// Track condition data for the horse-racing family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceCondition {
    pub surface: Surface,
    /// Distance in metres.
    pub distance: u32,
}

/// Meeting counters used by central horse racing ("5回中山8日").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldTimes {
    /// Meeting number within the year at this venue.
    pub held_times: u8,
    /// Day number within the meeting.
    pub held_day_times: u8,
}

/// A competitor in a mechanical-racing race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Frame / bike / boat number.
    pub position_number: u8,
    /// Registration number of the player.
    pub player_number: String,
}

impl Participant {
    pub fn new(position_number: u8, player_number: impl Into<String>) -> Self {
        Self {
            position_number,
            player_number: player_number.into(),
        }
    }
}

/// The raw field set of a race record, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRecordFields {
    pub race_type: RaceType,
    pub name: String,
    pub date_time: NaiveDateTime,
    pub location: String,
    pub grade: String,
    pub race_number: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held: Option<HeldTimes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RaceCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
}

/// A canonical, validated race record.
///
/// Serializes as its fields; deserialization re-runs validation and
/// recomputes the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RaceRecordFields", into = "RaceRecordFields")]
pub struct RaceRecord {
    id: RaceId,
    fields: RaceRecordFields,
}

impl RaceRecord {
    /// Starts building a record with the fields common to every race type.
    pub fn builder(
        race_type: RaceType,
        name: impl Into<String>,
        date_time: NaiveDateTime,
        location: impl Into<String>,
        grade: impl Into<String>,
        race_number: u8,
    ) -> RaceRecordBuilder {
        RaceRecordBuilder {
            fields: RaceRecordFields {
                race_type,
                name: name.into(),
                date_time,
                location: location.into(),
                grade: grade.into(),
                race_number,
                stage: None,
                held: None,
                condition: None,
                participants: None,
            },
        }
    }

    /// Validates a field set and derives the record's identity.
    ///
    /// # Errors
    ///
    /// [`RecordError::MutualExclusionViolation`] when a type-conditional field
    /// does not match the race type's family, or an identity error when the
    /// venue, race number or a participant position is invalid.
    pub fn from_fields(fields: RaceRecordFields) -> Result<Self, RecordError> {
        let race_type = fields.race_type;

        check_presence(race_type, "held times", fields.held.is_some(), race_type.has_held_times())?;
        check_presence(
            race_type,
            "condition",
            fields.condition.is_some(),
            race_type.is_horse_racing(),
        )?;
        check_presence(race_type, "stage", fields.stage.is_some(), race_type.is_mechanical_racing())?;
        check_presence(
            race_type,
            "participants",
            fields.participants.is_some(),
            race_type.is_mechanical_racing(),
        )?;

        let id = identity::encode_race(
            race_type,
            fields.date_time.date(),
            &fields.location,
            fields.race_number,
        )?;

        if let Some(participants) = &fields.participants {
            for participant in participants {
                id.participant(participant.position_number)?;
            }
        }

        Ok(Self { id, fields })
    }

    pub fn id(&self) -> &RaceId {
        &self.id
    }

    pub fn race_type(&self) -> RaceType {
        self.fields.race_type
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn date_time(&self) -> NaiveDateTime {
        self.fields.date_time
    }

    pub fn location(&self) -> &str {
        &self.fields.location
    }

    pub fn grade(&self) -> &str {
        &self.fields.grade
    }

    pub fn race_number(&self) -> u8 {
        self.fields.race_number
    }

    pub fn stage(&self) -> Option<&str> {
        self.fields.stage.as_deref()
    }

    pub fn held(&self) -> Option<HeldTimes> {
        self.fields.held
    }

    pub fn condition(&self) -> Option<RaceCondition> {
        self.fields.condition
    }

    pub fn participants(&self) -> &[Participant] {
        self.fields.participants.as_deref().unwrap_or_default()
    }

    /// Returns the identity of every participant in this race.
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants()
            .iter()
            .filter_map(|p| self.id.participant(p.position_number).ok())
            .collect()
    }

    pub fn fields(&self) -> &RaceRecordFields {
        &self.fields
    }

    pub fn into_fields(self) -> RaceRecordFields {
        self.fields
    }
}

impl TryFrom<RaceRecordFields> for RaceRecord {
    type Error = RecordError;

    fn try_from(fields: RaceRecordFields) -> Result<Self, Self::Error> {
        Self::from_fields(fields)
    }
}

impl From<RaceRecord> for RaceRecordFields {
    fn from(record: RaceRecord) -> Self {
        record.fields
    }
}

fn check_presence(
    race_type: RaceType,
    field: &'static str,
    present: bool,
    expected_present: bool,
) -> Result<(), RecordError> {
    if present == expected_present {
        Ok(())
    } else {
        Err(RecordError::exclusion(race_type, field, expected_present))
    }
}

/// Builder for [`RaceRecord`].
#[derive(Debug, Clone)]
pub struct RaceRecordBuilder {
    fields: RaceRecordFields,
}

impl RaceRecordBuilder {
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.fields.stage = Some(stage.into());
        self
    }

    pub fn with_held_times(mut self, held_times: u8, held_day_times: u8) -> Self {
        self.fields.held = Some(HeldTimes {
            held_times,
            held_day_times,
        });
        self
    }

    pub fn with_condition(mut self, surface: Surface, distance: u32) -> Self {
        self.fields.condition = Some(RaceCondition { surface, distance });
        self
    }

    pub fn with_participants(mut self, participants: Vec<Participant>) -> Self {
        self.fields.participants = Some(participants);
        self
    }

    pub fn build(self) -> Result<RaceRecord, RecordError> {
        RaceRecord::from_fields(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdentityError;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn arima() -> RaceRecordBuilder {
        RaceRecord::builder(RaceType::Jra, "有馬記念", at(2024, 12, 22, 15, 40), "中山", "GⅠ", 11)
    }

    fn keirin_final() -> RaceRecordBuilder {
        RaceRecord::builder(
            RaceType::Keirin,
            "KEIRINグランプリ",
            at(2024, 12, 30, 16, 30),
            "静岡",
            "GP",
            11,
        )
    }

    mod construction {
        use super::*;

        #[test]
        fn jra_record() {
            let record = arima()
                .with_held_times(5, 8)
                .with_condition(Surface::Turf, 2500)
                .build()
                .unwrap();
            assert_eq!(record.id().as_str(), "jra202412220611");
            assert_eq!(record.held().unwrap().held_day_times, 8);
            assert!(record.stage().is_none());
            assert!(record.participants().is_empty());
        }

        #[test]
        fn keirin_record_with_participants() {
            let record = keirin_final()
                .with_stage("S級グランプリ")
                .with_participants(vec![Participant::new(1, "014838"), Participant::new(9, "015242")])
                .build()
                .unwrap();
            assert_eq!(record.id().as_str(), "keirin202412303811");
            let ids: Vec<_> = record.participant_ids().iter().map(|i| i.to_string()).collect();
            assert_eq!(ids, vec!["keirin20241230381101", "keirin20241230381109"]);
        }

        #[test]
        fn nar_record_without_held_times() {
            let record = RaceRecord::builder(
                RaceType::Nar,
                "東京大賞典",
                at(2024, 12, 29, 16, 30),
                "大井",
                "GⅠ",
                10,
            )
            .with_condition(Surface::Dirt, 2000)
            .build()
            .unwrap();
            assert_eq!(record.id().as_str(), "nar202412292010");
        }

        #[test]
        fn date_uses_local_calendar_day() {
            // Late local start stays on the local date.
            let record = RaceRecord::builder(
                RaceType::World,
                "凱旋門賞",
                at(2024, 10, 6, 23, 5),
                "パリロンシャン",
                "GⅠ",
                4,
            )
            .with_condition(Surface::Turf, 2400)
            .build()
            .unwrap();
            assert_eq!(record.id().as_str(), "world202410060104");
        }
    }

    mod mutual_exclusion {
        use super::*;

        fn assert_violation(result: Result<RaceRecord, RecordError>, expected_field: &str) {
            match result {
                Err(RecordError::MutualExclusionViolation { field, .. }) => {
                    assert_eq!(field, expected_field)
                }
                other => panic!("expected violation on {expected_field}, got {other:?}"),
            }
        }

        #[test]
        fn jra_requires_held_times() {
            assert_violation(arima().with_condition(Surface::Turf, 2500).build(), "held times");
        }

        #[test]
        fn nar_rejects_held_times() {
            let result = RaceRecord::builder(
                RaceType::Nar,
                "東京大賞典",
                at(2024, 12, 29, 16, 30),
                "大井",
                "GⅠ",
                10,
            )
            .with_held_times(1, 1)
            .with_condition(Surface::Dirt, 2000)
            .build();
            assert_violation(result, "held times");
        }

        #[test]
        fn horse_racing_requires_condition() {
            assert_violation(arima().with_held_times(5, 8).build(), "condition");
        }

        #[test]
        fn horse_racing_rejects_stage() {
            let result = arima()
                .with_held_times(5, 8)
                .with_condition(Surface::Turf, 2500)
                .with_stage("決勝")
                .build();
            assert_violation(result, "stage");
        }

        #[test]
        fn mechanical_rejects_condition() {
            let result = keirin_final()
                .with_stage("S級グランプリ")
                .with_participants(vec![])
                .with_condition(Surface::Dirt, 2025)
                .build();
            assert_violation(result, "condition");
        }

        #[test]
        fn mechanical_requires_stage_and_participants() {
            assert_violation(keirin_final().with_participants(vec![]).build(), "stage");
            assert_violation(keirin_final().with_stage("S級グランプリ").build(), "participants");
        }
    }

    mod identity_failures {
        use super::*;

        #[test]
        fn unknown_venue() {
            let result = RaceRecord::builder(
                RaceType::Boatrace,
                "グランプリ",
                at(2024, 12, 22, 16, 30),
                "中山",
                "SG",
                12,
            )
            .with_stage("優勝戦")
            .with_participants(vec![])
            .build();
            assert!(matches!(
                result,
                Err(RecordError::Identity(IdentityError::UnknownLocation { .. }))
            ));
        }

        #[test]
        fn participant_outside_field_size() {
            let result = RaceRecord::builder(
                RaceType::Boatrace,
                "グランプリ",
                at(2024, 12, 22, 16, 30),
                "住之江",
                "SG",
                12,
            )
            .with_stage("優勝戦")
            .with_participants(vec![Participant::new(7, "4444")])
            .build();
            assert!(matches!(
                result,
                Err(RecordError::Identity(IdentityError::OutOfRange { .. }))
            ));
        }
    }

    #[test]
    fn serde_revalidates() {
        let record = arima()
            .with_held_times(5, 8)
            .with_condition(Surface::Turf, 2500)
            .build()
            .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["race_type"], "jra");
        assert!(json.get("stage").is_none());

        let parsed: RaceRecord = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(parsed, record);

        let mut broken = json;
        broken["stage"] = serde_json::Value::String("決勝".to_string());
        assert!(serde_json::from_value::<RaceRecord>(broken).is_err());
    }
}
