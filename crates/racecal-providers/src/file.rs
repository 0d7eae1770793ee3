//! JSON-file port implementations.
//!
//! - [`FileStorage`]: `{dir}/{race_type}.json`, an array of race records.
//! - [`FileCalendar`]: a single JSON array of calendar events.
//! - [`FileRaceSource`]: read-only fixtures at `{dir}/{race_type}/{YYYYMMDD}.json`.
//!
//! Writes go to a temporary sibling first and are renamed into place. A
//! missing file reads as empty; a file that does not parse is an error.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use racecal_core::{CalendarEvent, RaceId, RaceRecord, RaceType, TimeWindow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::port::{BoxFuture, CalendarPort, RaceSource, StoragePort};
use crate::raw_race::RawRace;
use crate::summary::{OperationSummary, Resource};

async fn read_json<T: DeserializeOwned>(path: &Path) -> ProviderResult<Option<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ProviderError::io(format!("failed to read {}", path.display())).with_source(e));
        }
    };
    serde_json::from_str(&content).map(Some).map_err(|e| {
        ProviderError::invalid_data(format!("failed to parse {}", path.display())).with_source(e)
    })
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> ProviderResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            ProviderError::io(format!("failed to create {}", parent.display())).with_source(e)
        })?;
    }
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| ProviderError::internal("failed to serialize").with_source(e))?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, content).await.map_err(|e| {
        ProviderError::io(format!("failed to write {}", temp_path.display())).with_source(e)
    })?;
    tokio::fs::rename(&temp_path, path).await.map_err(|e| {
        ProviderError::io(format!("failed to rename {}", temp_path.display())).with_source(e)
    })?;
    debug!(path = %path.display(), "Wrote JSON file");
    Ok(())
}

/// Race records stored as one JSON file per race type.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path_for(&self, race_type: RaceType) -> PathBuf {
        self.dir.join(format!("{}.json", race_type.prefix()))
    }

    async fn load(&self, race_type: RaceType) -> ProviderResult<Vec<RaceRecord>> {
        let records: Vec<RaceRecord> = read_json(&self.path_for(race_type))
            .await
            .map_err(|e| e.with_backend(self.name()))?
            .unwrap_or_default();
        // A record filed under the wrong race type would be invisible to sync.
        if let Some(stray) = records.iter().find(|r| r.race_type() != race_type) {
            return Err(ProviderError::invalid_data(format!(
                "{} found in {}",
                stray.id(),
                self.path_for(race_type).display()
            ))
            .with_backend(self.name()));
        }
        Ok(records)
    }

    async fn upsert_group(&self, race_type: RaceType, group: Vec<RaceRecord>, summary: &mut OperationSummary) {
        let mut stored: BTreeMap<String, RaceRecord> = match self.load(race_type).await {
            Ok(records) => records.into_iter().map(|r| (r.id().to_string(), r)).collect(),
            Err(e) => {
                for record in &group {
                    summary.record_error(Resource::Storage, record.id().to_string(), &e);
                }
                return;
            }
        };

        let ids: Vec<String> = group.iter().map(|r| r.id().to_string()).collect();
        for record in group {
            stored.insert(record.id().to_string(), record);
        }

        let records: Vec<&RaceRecord> = stored.values().collect();
        match write_json(&self.path_for(race_type), &records).await {
            Ok(()) => ids.iter().for_each(|_| summary.record_success()),
            Err(e) => {
                let e = e.with_backend(self.name());
                for id in ids {
                    summary.record_error(Resource::Storage, id, &e);
                }
            }
        }
    }
}

impl StoragePort for FileStorage {
    fn name(&self) -> &str {
        "file-storage"
    }

    fn fetch(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RaceRecord>>> {
        Box::pin(async move {
            let records = self.load(race_type).await?;
            Ok(records
                .into_iter()
                .filter(|r| window.contains_local(r.date_time()))
                .collect())
        })
    }

    fn upsert_batch(&self, records: Vec<RaceRecord>) -> BoxFuture<'_, OperationSummary> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut groups: BTreeMap<RaceType, Vec<RaceRecord>> = BTreeMap::new();
            for record in records {
                groups.entry(record.race_type()).or_default().push(record);
            }

            let mut summary = OperationSummary::new();
            for (race_type, group) in groups {
                self.upsert_group(race_type, group, &mut summary).await;
            }
            summary
        })
    }
}

/// Calendar events stored in a single JSON file.
#[derive(Debug)]
pub struct FileCalendar {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCalendar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> ProviderResult<BTreeMap<String, CalendarEvent>> {
        let events: Vec<CalendarEvent> = read_json(&self.path)
            .await
            .map_err(|e| e.with_backend(self.name()))?
            .unwrap_or_default();
        Ok(events.into_iter().map(|e| (e.id.to_string(), e)).collect())
    }

    async fn save(&self, events: &BTreeMap<String, CalendarEvent>) -> ProviderResult<()> {
        let events: Vec<&CalendarEvent> = events.values().collect();
        write_json(&self.path, &events)
            .await
            .map_err(|e| e.with_backend(self.name()))
    }

    /// Loads, applies `change`, and saves, holding the file lock throughout.
    async fn modify<F>(&self, change: F) -> ProviderResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, CalendarEvent>) -> ProviderResult<()> + Send,
    {
        let _guard = self.lock.lock().await;
        let mut events = self.load().await?;
        change(&mut events).map_err(|e| e.with_backend(self.name()))?;
        self.save(&events).await
    }
}

impl CalendarPort for FileCalendar {
    fn name(&self) -> &str {
        "file-calendar"
    }

    fn list(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            Ok(self
                .load()
                .await?
                .into_values()
                .filter(|e| e.race_type == race_type && window.contains(e.start))
                .collect())
        })
    }

    fn insert(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.modify(move |events| {
            let id = event.id.to_string();
            if events.contains_key(&id) {
                return Err(ProviderError::conflict(format!("{id} already exists")));
            }
            events.insert(id, event);
            Ok(())
        }))
    }

    fn update(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.modify(move |events| {
            let id = event.id.to_string();
            match events.get_mut(&id) {
                Some(slot) => {
                    *slot = event;
                    Ok(())
                }
                None => Err(ProviderError::not_found(format!("{id} does not exist"))),
            }
        }))
    }

    fn delete(&self, id: RaceId) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(self.modify(move |events| {
            events
                .remove(id.as_str())
                .map(|_| ())
                .ok_or_else(|| ProviderError::not_found(format!("{id} does not exist")))
        }))
    }
}

/// Raw race fixtures laid out as `{dir}/{race_type}/{YYYYMMDD}.json`.
#[derive(Debug, Clone)]
pub struct FileRaceSource {
    dir: PathBuf,
}

impl FileRaceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, date: NaiveDate, race_type: RaceType) -> PathBuf {
        self.dir
            .join(race_type.prefix())
            .join(format!("{}.json", date.format("%Y%m%d")))
    }
}

impl RaceSource for FileRaceSource {
    fn name(&self) -> &str {
        "file-source"
    }

    fn fetch_races(
        &self,
        date: NaiveDate,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawRace>>> {
        Box::pin(async move {
            let path = self.path_for(date, race_type);
            let races: Vec<RawRace> = read_json(&path)
                .await
                .map_err(|e| e.with_backend(self.name()))?
                .unwrap_or_default();
            if let Some(stray) = races.iter().find(|r| r.race_type != race_type || r.date != date) {
                return Err(ProviderError::invalid_data(format!(
                    "{} row for {} found in {}",
                    stray.race_type,
                    stray.date,
                    path.display()
                ))
                .with_backend(self.name()));
            }
            Ok(races)
        })
    }
}
