//! RawRace to RaceRecord conversion.
//!
//! Source text is parsed leniently (full-width separators, optional "R" and
//! "m" suffixes, surrounding whitespace) but every parsed value then goes
//! through the same validation as a hand-built record. A row that cannot be
//! normalized is reported, never guessed at.

use std::sync::LazyLock;

use chrono::NaiveTime;
use racecal_core::location::{self, CodeDialect};
use racecal_core::{Participant, RaceFamily, RaceRecord, Surface};
use regex::Regex;
use tracing::debug;

use crate::error::NormalizeError;
use crate::raw_race::{RawRace, RawVenue};

static RACE_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,2})\s*[RrＲ]?\s*$").expect("Invalid race number regex"));

static START_TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,2})[:：](\d{2})\s*$").expect("Invalid start time regex"));

static COURSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(芝|ダート|ダ|障害|障|AW|オールウェザー)\s*(\d{3,5})\s*[mｍ]?\s*$")
        .expect("Invalid course regex")
});

static HELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2})回\s*(\S+?)\s*(\d{1,2})日\s*$").expect("Invalid held regex")
});

static POSITION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,2})").expect("Invalid position regex"));

/// Converts a source row into a validated [`RaceRecord`].
///
/// # Errors
///
/// Returns [`NormalizeError`] if a field does not parse, a field required by
/// the race type is missing, or the assembled record fails validation.
pub fn normalize_race(raw: &RawRace) -> Result<RaceRecord, NormalizeError> {
    let race_type = raw.race_type;
    let venue = resolve_venue(raw)?;
    let race_number = parse_race_number(&raw.race_number)?;
    let start = parse_start_time(&raw.start_time)?;

    let mut builder = RaceRecord::builder(
        race_type,
        raw.name.trim(),
        raw.date.and_time(start),
        venue,
        raw.grade.trim(),
        race_number,
    );

    match race_type.family() {
        RaceFamily::Horse => {
            let course = raw.course.as_deref().ok_or(NormalizeError::MissingField {
                race_type,
                field: "course",
            })?;
            let (surface, distance) = parse_course(course)?;
            builder = builder.with_condition(surface, distance);

            if race_type.has_held_times() {
                let held = raw.held.as_deref().ok_or(NormalizeError::MissingField {
                    race_type,
                    field: "held",
                })?;
                let (held_times, held_day_times) = parse_held(held, venue)?;
                builder = builder.with_held_times(held_times, held_day_times);
            } else if raw.held.is_some() {
                debug!(%race_type, race = %raw.name, "Ignoring held text for race type without meetings");
            }
        }
        RaceFamily::Mechanical => {
            let stage = raw.stage.as_deref().map(str::trim).ok_or(NormalizeError::MissingField {
                race_type,
                field: "stage",
            })?;
            let participants = raw
                .participants
                .iter()
                .map(|p| {
                    Ok(Participant::new(
                        parse_position(&p.position)?,
                        p.player_number.trim(),
                    ))
                })
                .collect::<Result<Vec<_>, NormalizeError>>()?;
            builder = builder.with_stage(stage).with_participants(participants);
            if raw.course.is_some() {
                debug!(%race_type, race = %raw.name, "Ignoring course text for mechanical race");
            }
        }
    }

    Ok(builder.build()?)
}

/// Short label identifying a source row in failure reports.
pub fn row_label(raw: &RawRace) -> String {
    let venue = match &raw.venue {
        RawVenue::Name(name) => name.trim().to_string(),
        RawVenue::DisplayCode(code) => format!("#{code:02}"),
    };
    format!(
        "{}/{}/{}/{}",
        raw.race_type,
        raw.date.format("%Y%m%d"),
        venue,
        raw.race_number.trim()
    )
}

fn resolve_venue(raw: &RawRace) -> Result<&str, NormalizeError> {
    match &raw.venue {
        RawVenue::Name(name) => Ok(name.trim()),
        RawVenue::DisplayCode(code) => location::venue_name(raw.race_type, *code, CodeDialect::Display)
            .ok_or(NormalizeError::UnknownDisplayCode {
                race_type: raw.race_type,
                code: *code,
            }),
    }
}

fn parse_race_number(text: &str) -> Result<u8, NormalizeError> {
    RACE_NUMBER_REGEX
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| NormalizeError::invalid("race number", text))
}

fn parse_start_time(text: &str) -> Result<NaiveTime, NormalizeError> {
    START_TIME_REGEX
        .captures(text)
        .and_then(|caps| {
            let hour = caps[1].parse().ok()?;
            let minute = caps[2].parse().ok()?;
            NaiveTime::from_hms_opt(hour, minute, 0)
        })
        .ok_or_else(|| NormalizeError::invalid("start time", text))
}

fn parse_course(text: &str) -> Result<(Surface, u32), NormalizeError> {
    let caps = COURSE_REGEX
        .captures(text)
        .ok_or_else(|| NormalizeError::invalid("course", text))?;
    let surface = match &caps[1] {
        "芝" => Surface::Turf,
        "ダート" | "ダ" => Surface::Dirt,
        "障害" | "障" => Surface::Jump,
        _ => Surface::AllWeather,
    };
    let distance = caps[2]
        .parse()
        .map_err(|_| NormalizeError::invalid("course", text))?;
    Ok((surface, distance))
}

/// Parses "5回中山8日". The venue in the text must match the row's venue.
fn parse_held(text: &str, venue: &str) -> Result<(u8, u8), NormalizeError> {
    let caps = HELD_REGEX
        .captures(text)
        .ok_or_else(|| NormalizeError::invalid("held", text))?;
    if &caps[2] != venue {
        return Err(NormalizeError::invalid("held", text));
    }
    let held_times = caps[1].parse().map_err(|_| NormalizeError::invalid("held", text))?;
    let held_day_times = caps[3].parse().map_err(|_| NormalizeError::invalid("held", text))?;
    Ok((held_times, held_day_times))
}

fn parse_position(text: &str) -> Result<u8, NormalizeError> {
    POSITION_REGEX
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| NormalizeError::invalid("position", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use racecal_core::{IdentityError, RaceType, RecordError};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn arima() -> RawRace {
        RawRace::new(
            RaceType::Jra,
            "有馬記念",
            date(2024, 12, 22),
            "15:40",
            RawVenue::name("中山"),
            "11R",
            "GⅠ",
        )
        .with_course("芝2500m")
        .with_held("5回中山8日")
    }

    mod horse_racing {
        use super::*;

        #[test]
        fn jra_row() {
            let record = normalize_race(&arima()).unwrap();
            assert_eq!(record.id().as_str(), "jra202412220611");
            assert_eq!(record.date_time(), date(2024, 12, 22).and_hms_opt(15, 40, 0).unwrap());
            let held = record.held().unwrap();
            assert_eq!((held.held_times, held.held_day_times), (5, 8));
            let condition = record.condition().unwrap();
            assert_eq!(condition.surface, Surface::Turf);
            assert_eq!(condition.distance, 2500);
        }

        #[test]
        fn lenient_text() {
            let mut raw = arima();
            raw.race_number = " 11 ".to_string();
            raw.start_time = "15：40".to_string();
            raw.course = Some("芝 2500".to_string());
            let record = normalize_race(&raw).unwrap();
            assert_eq!(record.race_number(), 11);
            assert_eq!(record.condition().unwrap().distance, 2500);
        }

        #[test]
        fn nar_display_code_resolves_to_registry_identity() {
            let raw = RawRace::new(
                RaceType::Nar,
                "東京大賞典",
                date(2024, 12, 29),
                "16:30",
                RawVenue::DisplayCode(44),
                "10R",
                "GⅠ",
            )
            .with_course("ダ2000m")
            .with_held("ignored");
            let record = normalize_race(&raw).unwrap();
            assert_eq!(record.location(), "大井");
            assert_eq!(record.id().as_str(), "nar202412292010");
            assert!(record.held().is_none());
            assert_eq!(record.condition().unwrap().surface, Surface::Dirt);
        }

        #[test]
        fn unknown_display_code() {
            let mut raw = arima();
            raw.race_type = RaceType::Nar;
            raw.venue = RawVenue::DisplayCode(99);
            assert!(matches!(
                normalize_race(&raw),
                Err(NormalizeError::UnknownDisplayCode { code: 99, .. })
            ));
        }

        #[test]
        fn missing_course() {
            let mut raw = arima();
            raw.course = None;
            assert!(matches!(
                normalize_race(&raw),
                Err(NormalizeError::MissingField { field: "course", .. })
            ));
        }

        #[test]
        fn held_venue_must_match() {
            let raw = arima().with_held("5回東京8日");
            assert!(matches!(
                normalize_race(&raw),
                Err(NormalizeError::InvalidField { field: "held", .. })
            ));
        }
    }

    mod mechanical_racing {
        use super::*;

        fn grand_prix() -> RawRace {
            RawRace::new(
                RaceType::Boatrace,
                "グランプリ",
                date(2024, 12, 22),
                "16:35",
                RawVenue::name("住之江"),
                "12R",
                "SG",
            )
            .with_stage(" 優勝戦 ")
            .with_participant("1号艇", "4444")
            .with_participant("6号艇", "4320")
        }

        #[test]
        fn boatrace_row() {
            let record = normalize_race(&grand_prix()).unwrap();
            assert_eq!(record.id().as_str(), "boatrace202412221212");
            assert_eq!(record.stage(), Some("優勝戦"));
            let ids: Vec<String> = record.participant_ids().iter().map(|id| id.to_string()).collect();
            assert_eq!(ids, vec!["boatrace20241222121201", "boatrace20241222121206"]);
        }

        #[test]
        fn position_outside_field_size() {
            let raw = grand_prix().with_participant("7号艇", "1234");
            assert!(matches!(
                normalize_race(&raw),
                Err(NormalizeError::Record(RecordError::Identity(
                    IdentityError::OutOfRange { .. }
                )))
            ));
        }

        #[test]
        fn missing_stage() {
            let mut raw = grand_prix();
            raw.stage = None;
            assert!(matches!(
                normalize_race(&raw),
                Err(NormalizeError::MissingField { field: "stage", .. })
            ));
        }
    }

    #[test]
    fn bad_race_number_text() {
        let mut raw = arima();
        raw.race_number = "第11競走".to_string();
        assert!(matches!(
            normalize_race(&raw),
            Err(NormalizeError::InvalidField { field: "race number", .. })
        ));

        raw.race_number = "13R".to_string();
        assert!(matches!(normalize_race(&raw), Err(NormalizeError::Record(_))));
    }

    #[test]
    fn bad_start_time() {
        let mut raw = arima();
        raw.start_time = "25:00".to_string();
        assert!(matches!(
            normalize_race(&raw),
            Err(NormalizeError::InvalidField { field: "start time", .. })
        ));
    }

    #[test]
    fn labels() {
        assert_eq!(row_label(&arima()), "jra/20241222/中山/11R");
        let mut raw = arima();
        raw.venue = RawVenue::DisplayCode(5);
        assert_eq!(row_label(&raw), "jra/20241222/#05/11R");
    }
}
