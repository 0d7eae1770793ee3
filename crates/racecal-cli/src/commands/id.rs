//! `racecal id`.

use std::fmt::Write as _;

use chrono::NaiveDate;
use racecal_core::identity::{decode, encode_participant, encode_place, encode_race};
use racecal_core::{DecodedIdentity, IdentityKind, RaceType};

use crate::error::ClientResult;

pub fn encode(
    race_type: RaceType,
    date: NaiveDate,
    venue: &str,
    race: Option<u8>,
    position: Option<u8>,
) -> ClientResult<()> {
    println!("{}", encode_value(race_type, date, venue, race, position)?);
    Ok(())
}

/// The place, race or participant identity, depending on which numbers are given.
pub fn encode_value(
    race_type: RaceType,
    date: NaiveDate,
    venue: &str,
    race: Option<u8>,
    position: Option<u8>,
) -> ClientResult<String> {
    Ok(match (race, position) {
        (None, _) => encode_place(race_type, date, venue)?.into_string(),
        (Some(race), None) => encode_race(race_type, date, venue, race)?.into_string(),
        (Some(race), Some(position)) => {
            encode_participant(race_type, date, venue, race, position)?.into_string()
        }
    })
}

pub fn validate(race_type: RaceType, kind: IdentityKind, value: &str) -> ClientResult<()> {
    let decoded = decode(race_type, kind, value)?;
    print!("{}", render(&decoded));
    Ok(())
}

pub fn render(decoded: &DecodedIdentity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "race type: {}", decoded.race_type);
    let _ = writeln!(out, "kind:      {}", decoded.kind);
    if let Some(date) = decoded.date {
        let _ = writeln!(out, "date:      {date}");
    }
    let _ = writeln!(
        out,
        "location:  {} ({})",
        decoded.location_code,
        decoded.location.unwrap_or("unknown")
    );
    if let Some(race) = decoded.race_number {
        let _ = writeln!(out, "race:      {race}");
    }
    if let Some(position) = decoded.position_number {
        let _ = writeln!(out, "position:  {position}");
    }
    out
}
