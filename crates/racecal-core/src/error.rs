//! Error types for identities and race records.

use thiserror::Error;

use crate::identity::IdentityKind;
use crate::race_type::RaceType;

/// Errors raised while encoding or validating an identity.
///
/// These are never coerced: a bad identity is always reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The venue name has no canonical code for this race type.
    #[error("unknown location for {race_type}: {location}")]
    UnknownLocation {
        race_type: RaceType,
        location: String,
    },

    /// A year, race number or position number is outside its valid range.
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The identity does not start with the race type's prefix.
    #[error("identity {value:?} does not start with prefix {expected:?}")]
    WrongPrefix {
        expected: &'static str,
        value: String,
    },

    /// The part after the prefix is not the expected number of digits.
    #[error("malformed {kind} identity {value:?}: {reason}")]
    MalformedShape {
        kind: IdentityKind,
        value: String,
        reason: String,
    },

    /// The embedded race number is not in 1..=12.
    #[error("invalid race number {number:?} in identity {value:?}")]
    InvalidRaceNumber { value: String, number: String },

    /// The embedded position number is not valid for the race type.
    #[error("invalid position number {number:?} in identity {value:?}")]
    InvalidPositionNumber { value: String, number: String },
}

impl IdentityError {
    pub(crate) fn out_of_range(field: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    pub(crate) fn malformed(
        kind: IdentityKind,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedShape {
            kind,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Returns a stable snake_case name for this error variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownLocation { .. } => "unknown_location",
            Self::OutOfRange { .. } => "out_of_range",
            Self::WrongPrefix { .. } => "wrong_prefix",
            Self::MalformedShape { .. } => "malformed_shape",
            Self::InvalidRaceNumber { .. } => "invalid_race_number",
            Self::InvalidPositionNumber { .. } => "invalid_position_number",
        }
    }
}

/// Errors raised while constructing a [`RaceRecord`](crate::record::RaceRecord).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A type-conditional field is present (or absent) for the wrong family.
    #[error("{race_type} record must {} {field}", presence(.expected_present))]
    MutualExclusionViolation {
        race_type: RaceType,
        field: &'static str,
        expected_present: bool,
    },

    /// The record's identity could not be built.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

fn presence(expected_present: &bool) -> &'static str {
    if *expected_present { "have" } else { "not have" }
}

impl RecordError {
    pub(crate) fn exclusion(race_type: RaceType, field: &'static str, expected_present: bool) -> Self {
        Self::MutualExclusionViolation {
            race_type,
            field,
            expected_present,
        }
    }
}
