//! Core types: race types, venue codes, identities, records, eligibility, calendar events

pub mod eligibility;
pub mod error;
pub mod event;
pub mod grade;
pub mod identity;
pub mod location;
pub mod race_type;
pub mod record;
pub mod time;
pub mod tracing;

pub use eligibility::{EligibilityFilter, PRIORITY_THRESHOLD};
pub use error::{IdentityError, RecordError};
pub use event::{CalendarEvent, EVENT_DURATION_MINUTES};
pub use grade::DisplayGrades;
pub use identity::{DecodedIdentity, Identity, IdentityKind, ParticipantId, PlaceId, RaceId};
pub use location::{CodeDialect, LocationCode};
pub use race_type::{ParseRaceTypeError, RaceFamily, RaceType};
pub use record::{HeldTimes, Participant, RaceCondition, RaceRecord, RaceRecordFields, Surface};
pub use time::{TimeWindow, jst, local_to_utc};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
