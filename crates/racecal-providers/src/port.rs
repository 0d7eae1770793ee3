//! Port traits for the external systems the engine talks to.
//!
//! - [`CalendarPort`]: the external calendar holding one event per race.
//! - [`StoragePort`]: the store of canonical race records.
//! - [`RaceSource`]: where raw schedule rows come from.
//!
//! Implementations are injected as trait objects. Methods return boxed
//! futures so the traits stay object-safe.

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;
use racecal_core::{CalendarEvent, RaceId, RaceRecord, RaceType, TimeWindow};

use crate::error::ProviderResult;
use crate::raw_race::RawRace;
use crate::summary::OperationSummary;

/// A boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The external calendar.
///
/// Events are addressed by the [`RaceId`] they were rendered from.
pub trait CalendarPort: Send + Sync {
    /// Backend name used in logs and error reports.
    fn name(&self) -> &str;

    /// Lists the events of one race type starting inside `window`.
    ///
    /// An error here means the listing is unknown, which is different from
    /// an empty calendar.
    fn list(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarEvent>>>;

    /// Creates an event. Fails with `Conflict` if the id already exists.
    fn insert(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>>;

    /// Replaces an event. Fails with `NotFound` if the id does not exist.
    fn update(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>>;

    /// Removes an event. Fails with `NotFound` if the id does not exist.
    fn delete(&self, id: RaceId) -> BoxFuture<'_, ProviderResult<()>>;
}

/// The canonical record store.
pub trait StoragePort: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the records of one race type starting inside `window`.
    fn fetch(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RaceRecord>>>;

    /// Inserts or replaces records by id.
    ///
    /// Never fails as a whole: every record is counted as a success or a
    /// failure in the returned summary.
    fn upsert_batch(&self, records: Vec<RaceRecord>) -> BoxFuture<'_, OperationSummary>;
}

/// A source of raw schedule rows.
pub trait RaceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches every race of one type held on `date`.
    ///
    /// `Ok(vec![])` means no races that day. Errors mean the day is unknown
    /// and must not be written.
    fn fetch_races(
        &self,
        date: NaiveDate,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawRace>>>;
}

impl<T: CalendarPort + ?Sized> CalendarPort for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarEvent>>> {
        (**self).list(window, race_type)
    }

    fn insert(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).insert(event)
    }

    fn update(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).update(event)
    }

    fn delete(&self, id: RaceId) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id)
    }
}

impl<T: StoragePort + ?Sized> StoragePort for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RaceRecord>>> {
        (**self).fetch(window, race_type)
    }

    fn upsert_batch(&self, records: Vec<RaceRecord>) -> BoxFuture<'_, OperationSummary> {
        (**self).upsert_batch(records)
    }
}

impl<T: RaceSource + ?Sized> RaceSource for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_races(
        &self,
        date: NaiveDate,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawRace>>> {
        (**self).fetch_races(date, race_type)
    }
}
