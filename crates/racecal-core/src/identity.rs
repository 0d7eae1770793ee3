//! Deterministic identities for places, races and race participants.
//!
//! Identities are fixed-width, prefix-tagged strings:
//!
//! ```text
//! place        {prefix}{YYYYMMDD}{LL}          10 digits after the prefix
//! race         {place}{NN}                     12 digits, NN in 01..=12
//! participant  {race}{PP}                      14 digits, PP within field size
//! ```
//!
//! Every identity is a pure function of race type, date, venue code and
//! ordinal numbers, so two components can agree on a key without sharing
//! anything but the static venue tables. The reconciliation engine joins
//! desired records and calendar events on plain string equality of these
//! keys.
//!
//! The typed wrappers ([`PlaceId`], [`RaceId`], [`ParticipantId`]) can only
//! be obtained through encoding or validation.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IdentityError;
use crate::location::{self, CodeDialect, LocationCode};
use crate::race_type::RaceType;

/// Lowest valid race number.
pub const MIN_RACE_NUMBER: u8 = 1;
/// Highest valid race number.
pub const MAX_RACE_NUMBER: u8 = 12;

const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

const DATE_WIDTH: usize = 8;
const CODE_WIDTH: usize = 2;
const RACE_OFFSET: usize = DATE_WIDTH + CODE_WIDTH;
const POSITION_OFFSET: usize = RACE_OFFSET + 2;

/// The shape of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    Place,
    Race,
    Participant,
}

impl IdentityKind {
    /// Number of digits following the race type prefix.
    pub fn digits(&self) -> usize {
        match self {
            Self::Place => 10,
            Self::Race => 12,
            Self::Participant => 14,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Place => "place",
            Self::Race => "race",
            Self::Participant => "participant",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "place" => Ok(Self::Place),
            "race" => Ok(Self::Race),
            "participant" | "player" => Ok(Self::Participant),
            other => Err(format!("unknown identity kind: {}", other)),
        }
    }
}

macro_rules! identity_newtype {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            race_type: RaceType,
            value: String,
        }

        impl $name {
            /// Validates `value` as an identity of this kind for `race_type`.
            pub fn validate(race_type: RaceType, value: &str) -> Result<Self, IdentityError> {
                check(race_type, $kind, value)?;
                Ok(Self {
                    race_type,
                    value: value.to_string(),
                })
            }

            /// Parses an identity, detecting the race type from its prefix.
            pub fn parse(value: &str) -> Result<Self, IdentityError> {
                Self::validate(detect_race_type($kind, value)?, value)
            }

            pub fn race_type(&self) -> RaceType {
                self.race_type
            }

            pub fn as_str(&self) -> &str {
                &self.value
            }

            pub fn into_string(self) -> String {
                self.value
            }

            /// Decodes the identity into its components.
            pub fn decode(&self) -> DecodedIdentity {
                // Validated on construction, so only the calendar date can be off.
                decode_unchecked(self.race_type, $kind, &self.value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.value
            }
        }

        impl FromStr for $name {
            type Err = IdentityError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

identity_newtype!(
    /// Identity of one race meeting: race type, date and venue.
    PlaceId,
    IdentityKind::Place
);
identity_newtype!(
    /// Identity of one race. Used as the calendar event id.
    RaceId,
    IdentityKind::Race
);
identity_newtype!(
    /// Identity of one participant (post/frame/boat number) in a race.
    ParticipantId,
    IdentityKind::Participant
);

impl RaceId {
    /// Returns the place this race belongs to.
    pub fn place(&self) -> PlaceId {
        let end = self.race_type.prefix().len() + RACE_OFFSET;
        PlaceId {
            race_type: self.race_type,
            value: self.value[..end].to_string(),
        }
    }

    /// Returns the race number encoded in this identity.
    pub fn race_number(&self) -> u8 {
        let start = self.race_type.prefix().len() + RACE_OFFSET;
        self.value[start..start + 2].parse().unwrap_or_default()
    }

    /// Builds the identity of a participant in this race.
    pub fn participant(&self, position_number: u8) -> Result<ParticipantId, IdentityError> {
        check_position(self.race_type, position_number)?;
        Ok(ParticipantId {
            race_type: self.race_type,
            value: format!("{}{:02}", self.value, position_number),
        })
    }
}

impl ParticipantId {
    /// Returns the race this participant runs in.
    pub fn race(&self) -> RaceId {
        let end = self.race_type.prefix().len() + POSITION_OFFSET;
        RaceId {
            race_type: self.race_type,
            value: self.value[..end].to_string(),
        }
    }
}

/// Any of the three identity kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Place(PlaceId),
    Race(RaceId),
    Participant(ParticipantId),
}

impl Identity {
    pub fn kind(&self) -> IdentityKind {
        match self {
            Self::Place(_) => IdentityKind::Place,
            Self::Race(_) => IdentityKind::Race,
            Self::Participant(_) => IdentityKind::Participant,
        }
    }

    pub fn race_type(&self) -> RaceType {
        match self {
            Self::Place(id) => id.race_type(),
            Self::Race(id) => id.race_type(),
            Self::Participant(id) => id.race_type(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Place(id) => id.as_str(),
            Self::Race(id) => id.as_str(),
            Self::Participant(id) => id.as_str(),
        }
    }

    pub fn decode(&self) -> DecodedIdentity {
        match self {
            Self::Place(id) => id.decode(),
            Self::Race(id) => id.decode(),
            Self::Participant(id) => id.decode(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The components of a decoded identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedIdentity {
    pub race_type: RaceType,
    pub kind: IdentityKind,
    /// `None` only when the embedded date is not a real calendar date.
    pub date: Option<NaiveDate>,
    pub location_code: LocationCode,
    /// Venue name, when the code is in the registry table.
    pub location: Option<&'static str>,
    pub race_number: Option<u8>,
    pub position_number: Option<u8>,
}

impl DecodedIdentity {
    /// Re-encodes the components. Reproduces the decoded string exactly.
    pub fn encode(&self) -> String {
        let mut out = format!(
            "{}{}{}",
            self.race_type.prefix(),
            self.date
                .map(|d| d.format("%Y%m%d").to_string())
                .unwrap_or_default(),
            self.location_code
        );
        if let Some(race) = self.race_number {
            out.push_str(&format!("{:02}", race));
        }
        if let Some(position) = self.position_number {
            out.push_str(&format!("{:02}", position));
        }
        out
    }
}

/// Encodes the identity of a race meeting.
///
/// # Errors
///
/// Returns [`IdentityError::UnknownLocation`] if the venue has no canonical
/// code for the race type, and [`IdentityError::OutOfRange`] for a year that
/// does not fit in four digits.
pub fn encode_place(
    race_type: RaceType,
    date: NaiveDate,
    location: &str,
) -> Result<PlaceId, IdentityError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return Err(IdentityError::out_of_range(
            "year",
            date.year().into(),
            MIN_YEAR.into(),
            MAX_YEAR.into(),
        ));
    }
    let code = location::canonical_code(race_type, location).ok_or_else(|| {
        IdentityError::UnknownLocation {
            race_type,
            location: location.to_string(),
        }
    })?;
    Ok(PlaceId {
        race_type,
        value: format!("{}{}{}", race_type.prefix(), date.format("%Y%m%d"), code),
    })
}

/// Encodes the identity of a race.
///
/// # Errors
///
/// Returns [`IdentityError::OutOfRange`] unless `race_number` is in 1..=12,
/// and [`IdentityError::UnknownLocation`] for an unmapped venue.
pub fn encode_race(
    race_type: RaceType,
    date: NaiveDate,
    location: &str,
    race_number: u8,
) -> Result<RaceId, IdentityError> {
    check_race_number(race_number)?;
    let place = encode_place(race_type, date, location)?;
    Ok(RaceId {
        race_type,
        value: format!("{}{:02}", place.value, race_number),
    })
}

/// Encodes the identity of a participant.
///
/// # Errors
///
/// Returns [`IdentityError::OutOfRange`] when the race number or the
/// position number (which depends on the race type's field size) is invalid.
pub fn encode_participant(
    race_type: RaceType,
    date: NaiveDate,
    location: &str,
    race_number: u8,
    position_number: u8,
) -> Result<ParticipantId, IdentityError> {
    check_position(race_type, position_number)?;
    encode_race(race_type, date, location, race_number)?.participant(position_number)
}

/// Validates an identity string of the given kind.
///
/// Checks, in order: prefix, shape, embedded race number, embedded position
/// number.
pub fn validate(
    race_type: RaceType,
    kind: IdentityKind,
    value: &str,
) -> Result<Identity, IdentityError> {
    Ok(match kind {
        IdentityKind::Place => Identity::Place(PlaceId::validate(race_type, value)?),
        IdentityKind::Race => Identity::Race(RaceId::validate(race_type, value)?),
        IdentityKind::Participant => {
            Identity::Participant(ParticipantId::validate(race_type, value)?)
        }
    })
}

/// Validates and decodes an identity string.
///
/// Unlike [`validate`], this also rejects identities whose embedded date is
/// not a real calendar date.
pub fn decode(
    race_type: RaceType,
    kind: IdentityKind,
    value: &str,
) -> Result<DecodedIdentity, IdentityError> {
    check(race_type, kind, value)?;
    let decoded = decode_unchecked(race_type, kind, value);
    if decoded.date.is_none() {
        return Err(IdentityError::malformed(kind, value, "invalid calendar date"));
    }
    Ok(decoded)
}

fn check_race_number(race_number: u8) -> Result<(), IdentityError> {
    if (MIN_RACE_NUMBER..=MAX_RACE_NUMBER).contains(&race_number) {
        Ok(())
    } else {
        Err(IdentityError::out_of_range(
            "race number",
            race_number.into(),
            MIN_RACE_NUMBER.into(),
            MAX_RACE_NUMBER.into(),
        ))
    }
}

fn check_position(race_type: RaceType, position_number: u8) -> Result<(), IdentityError> {
    if race_type.is_valid_position(position_number) {
        Ok(())
    } else {
        Err(IdentityError::out_of_range(
            "position number",
            position_number.into(),
            1,
            race_type.max_field_size().into(),
        ))
    }
}

fn check(race_type: RaceType, kind: IdentityKind, value: &str) -> Result<(), IdentityError> {
    let digits = value
        .strip_prefix(race_type.prefix())
        .ok_or_else(|| IdentityError::WrongPrefix {
            expected: race_type.prefix(),
            value: value.to_string(),
        })?;

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentityError::malformed(kind, value, "non-digit characters after prefix"));
    }
    if digits.len() != kind.digits() {
        return Err(IdentityError::malformed(
            kind,
            value,
            format!("expected {} digits, found {}", kind.digits(), digits.len()),
        ));
    }

    if kind != IdentityKind::Place {
        let number = &digits[RACE_OFFSET..RACE_OFFSET + 2];
        let valid = number
            .parse::<u8>()
            .is_ok_and(|n| (MIN_RACE_NUMBER..=MAX_RACE_NUMBER).contains(&n));
        if !valid {
            return Err(IdentityError::InvalidRaceNumber {
                value: value.to_string(),
                number: number.to_string(),
            });
        }
    }

    if kind == IdentityKind::Participant {
        let number = &digits[POSITION_OFFSET..POSITION_OFFSET + 2];
        let valid = number
            .parse::<u8>()
            .is_ok_and(|n| race_type.is_valid_position(n));
        if !valid {
            return Err(IdentityError::InvalidPositionNumber {
                value: value.to_string(),
                number: number.to_string(),
            });
        }
    }

    Ok(())
}

fn detect_race_type(kind: IdentityKind, value: &str) -> Result<RaceType, IdentityError> {
    RaceType::ALL
        .into_iter()
        .find(|rt| value.starts_with(rt.prefix()))
        .ok_or_else(|| IdentityError::malformed(kind, value, "no known race type prefix"))
}

/// Splits an already-checked identity into its components.
fn decode_unchecked(race_type: RaceType, kind: IdentityKind, value: &str) -> DecodedIdentity {
    let digits = &value[race_type.prefix().len()..];
    let two = |offset: usize| digits[offset..offset + 2].parse::<u8>().unwrap_or_default();

    let date = NaiveDate::parse_from_str(&digits[..DATE_WIDTH], "%Y%m%d").ok();
    let code = two(DATE_WIDTH);
    DecodedIdentity {
        race_type,
        kind,
        date,
        location_code: LocationCode(code),
        location: location::venue_name(race_type, code, CodeDialect::Registry),
        race_number: (kind != IdentityKind::Place).then(|| two(RACE_OFFSET)),
        position_number: (kind == IdentityKind::Participant).then(|| two(POSITION_OFFSET)),
    }
}
