//! Port traits and implementations.
//!
//! This crate is the boundary between the sync engine and the outside world:
//!
//! - [`CalendarPort`], [`StoragePort`], [`RaceSource`] - the traits the engine is written against
//! - [`RawRace`] and [`normalize_race`] - source rows and their conversion to records
//! - [`upsert_in_chunks`] - rate-friendly storage writes
//! - [`LoggedCalendar`], [`LoggedStorage`] - tracing middleware
//! - [`memory`] and [`file`] - in-memory and JSON-file backends
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   fetch_races    ┌──────────────┐
//! │  RaceSource  │ ───────────────▶ │   RawRace    │
//! └──────────────┘                  └──────┬───────┘
//!                                          │ normalize_race()
//!                                          ▼
//! ┌──────────────┐   upsert_batch   ┌──────────────┐
//! │ StoragePort  │ ◀─────────────── │  RaceRecord  │
//! └──────┬───────┘                  └──────────────┘
//!        │ fetch
//!        ▼
//!   reconcile (racecal-sync)
//!        │ insert / update / delete
//!        ▼
//! ┌──────────────┐
//! │ CalendarPort │
//! └──────────────┘
//! ```

pub mod batch;
pub mod error;
pub mod file;
pub mod logging;
pub mod memory;
pub mod normalize;
pub mod port;
pub mod raw_race;
pub mod summary;

pub use batch::{DEFAULT_BATCH_SIZE, upsert_in_chunks};
pub use error::{NormalizeError, ProviderError, ProviderErrorCode, ProviderResult};
pub use file::{FileCalendar, FileRaceSource, FileStorage};
pub use logging::{LoggedCalendar, LoggedStorage};
pub use memory::{CalendarCall, CalendarOp, MemoryCalendar, MemorySource, MemoryStorage};
pub use normalize::{normalize_race, row_label};
pub use port::{BoxFuture, CalendarPort, RaceSource, StoragePort};
pub use raw_race::{RawParticipant, RawRace, RawVenue};
pub use summary::{OperationFailure, OperationSummary, Resource};
