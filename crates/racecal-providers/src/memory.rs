//! In-memory port implementations.
//!
//! Test backends for the workspace. Every port records the calls it receives
//! and can be told to fail specific operations.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use racecal_core::{CalendarEvent, RaceId, RaceRecord, RaceType, TimeWindow};
use tokio::time::Instant;

use crate::error::{ProviderError, ProviderResult};
use crate::port::{BoxFuture, CalendarPort, RaceSource, StoragePort};
use crate::raw_race::RawRace;
use crate::summary::{OperationSummary, Resource};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A calendar operation, for call logs and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarOp {
    List,
    Insert,
    Update,
    Delete,
}

/// One call received by [`MemoryCalendar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCall {
    pub op: CalendarOp,
    /// Race type for `List`, event id otherwise.
    pub target: String,
}

#[derive(Debug, Default)]
struct CalendarState {
    events: BTreeMap<String, CalendarEvent>,
    calls: Vec<CalendarCall>,
    failing_lists: HashSet<RaceType>,
    failing_ops: HashSet<(CalendarOp, String)>,
}

impl CalendarState {
    fn check(&mut self, op: CalendarOp, target: &str) -> ProviderResult<()> {
        self.calls.push(CalendarCall {
            op,
            target: target.to_string(),
        });
        if self.failing_ops.contains(&(op, target.to_string())) {
            return Err(ProviderError::unavailable(format!("injected {op:?} failure for {target}")));
        }
        Ok(())
    }
}

/// A calendar held in memory.
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    state: Mutex<CalendarState>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = CalendarEvent>) -> Self {
        let calendar = Self::new();
        {
            let mut state = lock(&calendar.state);
            for event in events {
                state.events.insert(event.id.to_string(), event);
            }
        }
        calendar
    }

    /// Makes every `list` for `race_type` fail.
    pub fn fail_list(&self, race_type: RaceType) {
        lock(&self.state).failing_lists.insert(race_type);
    }

    /// Makes `op` fail for the event `id`.
    pub fn fail_on(&self, op: CalendarOp, id: &str) {
        lock(&self.state).failing_ops.insert((op, id.to_string()));
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        lock(&self.state).events.values().cloned().collect()
    }

    pub fn event(&self, id: &str) -> Option<CalendarEvent> {
        lock(&self.state).events.get(id).cloned()
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        lock(&self.state).calls.clone()
    }

    /// Returns true if any mutating call was received.
    pub fn was_mutated(&self) -> bool {
        lock(&self.state).calls.iter().any(|c| c.op != CalendarOp::List)
    }
}

impl CalendarPort for MemoryCalendar {
    fn name(&self) -> &str {
        "memory-calendar"
    }

    fn list(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.calls.push(CalendarCall {
                op: CalendarOp::List,
                target: race_type.to_string(),
            });
            if state.failing_lists.contains(&race_type) {
                return Err(ProviderError::unavailable(format!("injected list failure for {race_type}")));
            }
            Ok(state
                .events
                .values()
                .filter(|e| e.race_type == race_type && window.contains(e.start))
                .cloned()
                .collect())
        })
    }

    fn insert(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            let id = event.id.to_string();
            state.check(CalendarOp::Insert, &id)?;
            if state.events.contains_key(&id) {
                return Err(ProviderError::conflict(format!("{id} already exists")));
            }
            state.events.insert(id, event);
            Ok(())
        })
    }

    fn update(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            let id = event.id.to_string();
            state.check(CalendarOp::Update, &id)?;
            match state.events.get_mut(&id) {
                Some(slot) => {
                    *slot = event;
                    Ok(())
                }
                None => Err(ProviderError::not_found(format!("{id} does not exist"))),
            }
        })
    }

    fn delete(&self, id: RaceId) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.check(CalendarOp::Delete, id.as_str())?;
            state
                .events
                .remove(id.as_str())
                .map(|_| ())
                .ok_or_else(|| ProviderError::not_found(format!("{id} does not exist")))
        })
    }
}

#[derive(Debug, Default)]
struct StorageState {
    records: BTreeMap<String, RaceRecord>,
    failing_fetches: HashSet<RaceType>,
    failing_ids: HashSet<String>,
    batch_sizes: Vec<usize>,
}

/// A record store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<StorageState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = RaceRecord>) -> Self {
        let storage = Self::new();
        {
            let mut state = lock(&storage.state);
            for record in records {
                state.records.insert(record.id().to_string(), record);
            }
        }
        storage
    }

    /// Makes every `fetch` for `race_type` fail.
    pub fn fail_fetch(&self, race_type: RaceType) {
        lock(&self.state).failing_fetches.insert(race_type);
    }

    /// Makes upserting the record `id` fail.
    pub fn fail_upsert(&self, id: &str) {
        lock(&self.state).failing_ids.insert(id.to_string());
    }

    pub fn records(&self) -> Vec<RaceRecord> {
        lock(&self.state).records.values().cloned().collect()
    }

    /// Sizes of the batches received by `upsert_batch`, in order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        lock(&self.state).batch_sizes.clone()
    }
}

impl StoragePort for MemoryStorage {
    fn name(&self) -> &str {
        "memory-storage"
    }

    fn fetch(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RaceRecord>>> {
        Box::pin(async move {
            let state = lock(&self.state);
            if state.failing_fetches.contains(&race_type) {
                return Err(ProviderError::unavailable(format!("injected fetch failure for {race_type}")));
            }
            Ok(state
                .records
                .values()
                .filter(|r| r.race_type() == race_type && window.contains_local(r.date_time()))
                .cloned()
                .collect())
        })
    }

    fn upsert_batch(&self, records: Vec<RaceRecord>) -> BoxFuture<'_, OperationSummary> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.batch_sizes.push(records.len());
            let mut summary = OperationSummary::new();
            for record in records {
                let id = record.id().to_string();
                if state.failing_ids.contains(&id) {
                    summary.record_failure(Resource::Storage, id, "injected upsert failure");
                } else {
                    state.records.insert(id, record);
                    summary.record_success();
                }
            }
            summary
        })
    }
}

#[derive(Debug, Default)]
struct SourceState {
    races: HashMap<(RaceType, NaiveDate), Vec<RawRace>>,
    failing: HashSet<(RaceType, NaiveDate)>,
    calls: Vec<(RaceType, NaiveDate, Instant)>,
}

/// A race source serving fixed rows.
#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<SourceState>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row, keyed by its race type and date.
    pub fn add(&self, race: RawRace) {
        lock(&self.state)
            .races
            .entry((race.race_type, race.date))
            .or_default()
            .push(race);
    }

    /// Makes fetching `race_type` on `date` fail.
    pub fn fail_on(&self, race_type: RaceType, date: NaiveDate) {
        lock(&self.state).failing.insert((race_type, date));
    }

    /// Calls received, with the instant each one arrived.
    pub fn calls(&self) -> Vec<(RaceType, NaiveDate, Instant)> {
        lock(&self.state).calls.clone()
    }
}

impl RaceSource for MemorySource {
    fn name(&self) -> &str {
        "memory-source"
    }

    fn fetch_races(
        &self,
        date: NaiveDate,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawRace>>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.calls.push((race_type, date, Instant::now()));
            if state.failing.contains(&(race_type, date)) {
                return Err(ProviderError::unavailable(format!(
                    "injected source failure for {race_type} on {date}"
                )));
            }
            Ok(state.races.get(&(race_type, date)).cloned().unwrap_or_default())
        })
    }
}
