//! Logging middleware for ports.
//!
//! [`LoggedCalendar`] and [`LoggedStorage`] wrap any port and trace every
//! call: `debug!` with the elapsed time on success, `warn!` with the error
//! on failure. The wrapped port never sees the difference.

use std::time::Instant;

use racecal_core::{CalendarEvent, RaceId, RaceRecord, RaceType, TimeWindow};
use tracing::{debug, warn};

use crate::error::ProviderResult;
use crate::port::{BoxFuture, CalendarPort, StoragePort};
use crate::summary::OperationSummary;

fn log_outcome<T>(
    port: &str,
    op: &'static str,
    target: &str,
    started: Instant,
    result: &ProviderResult<T>,
) {
    let duration_ms = started.elapsed().as_millis();
    match result {
        Ok(_) => debug!(port, op, target, duration_ms, "Port call succeeded"),
        Err(e) => warn!(port, op, target, duration_ms, error = %e, "Port call failed"),
    }
}

/// A [`CalendarPort`] that logs every call.
#[derive(Debug)]
pub struct LoggedCalendar<C> {
    inner: C,
}

impl<C: CalendarPort> LoggedCalendar<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: CalendarPort> CalendarPort for LoggedCalendar<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            let started = Instant::now();
            let result = self.inner.list(window, race_type).await;
            log_outcome(self.name(), "list", race_type.prefix(), started, &result);
            if let Ok(events) = &result {
                debug!(port = self.name(), %race_type, count = events.len(), "Listed calendar events");
            }
            result
        })
    }

    fn insert(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let id = event.id.to_string();
            let started = Instant::now();
            let result = self.inner.insert(event).await;
            log_outcome(self.name(), "insert", &id, started, &result);
            result
        })
    }

    fn update(&self, event: CalendarEvent) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let id = event.id.to_string();
            let started = Instant::now();
            let result = self.inner.update(event).await;
            log_outcome(self.name(), "update", &id, started, &result);
            result
        })
    }

    fn delete(&self, id: RaceId) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            let target = id.to_string();
            let started = Instant::now();
            let result = self.inner.delete(id).await;
            log_outcome(self.name(), "delete", &target, started, &result);
            result
        })
    }
}

/// A [`StoragePort`] that logs every call.
#[derive(Debug)]
pub struct LoggedStorage<S> {
    inner: S,
}

impl<S: StoragePort> LoggedStorage<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: StoragePort> StoragePort for LoggedStorage<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        window: TimeWindow,
        race_type: RaceType,
    ) -> BoxFuture<'_, ProviderResult<Vec<RaceRecord>>> {
        Box::pin(async move {
            let started = Instant::now();
            let result = self.inner.fetch(window, race_type).await;
            log_outcome(self.name(), "fetch", race_type.prefix(), started, &result);
            if let Ok(records) = &result {
                debug!(port = self.name(), %race_type, count = records.len(), "Fetched stored records");
            }
            result
        })
    }

    fn upsert_batch(&self, records: Vec<RaceRecord>) -> BoxFuture<'_, OperationSummary> {
        Box::pin(async move {
            let size = records.len();
            let started = Instant::now();
            let summary = self.inner.upsert_batch(records).await;
            let duration_ms = started.elapsed().as_millis();
            if summary.is_clean() {
                debug!(port = self.name(), op = "upsert_batch", size, duration_ms, "Port call succeeded");
            } else {
                warn!(
                    port = self.name(),
                    op = "upsert_batch",
                    size,
                    failed = summary.failure_count,
                    duration_ms,
                    "Port call partially failed"
                );
            }
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{CalendarOp, MemoryCalendar, MemoryStorage};
    use chrono::NaiveDate;
    use racecal_core::Surface;

    fn record() -> RaceRecord {
        RaceRecord::builder(
            RaceType::World,
            "凱旋門賞",
            NaiveDate::from_ymd_opt(2024, 10, 6)
                .unwrap()
                .and_hms_opt(23, 5, 0)
                .unwrap(),
            "パリロンシャン",
            "GⅠ",
            4,
        )
        .with_condition(Surface::Turf, 2400)
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn calendar_results_pass_through() {
        let calendar = LoggedCalendar::new(MemoryCalendar::new());
        let event = CalendarEvent::from_record(&record());
        calendar.insert(event.clone()).await.unwrap();
        assert!(calendar.insert(event.clone()).await.is_err());

        calendar.inner().fail_on(CalendarOp::Delete, event.id.as_str());
        assert!(calendar.delete(event.id.clone()).await.is_err());
        assert_eq!(calendar.inner().events().len(), 1);
        assert_eq!(calendar.name(), "memory-calendar");
    }

    #[tokio::test]
    async fn storage_results_pass_through() {
        let storage = LoggedStorage::new(MemoryStorage::new());
        let summary = storage.upsert_batch(vec![record()]).await;
        assert!(summary.is_clean());

        let window = TimeWindow::for_local_days(NaiveDate::from_ymd_opt(2024, 10, 6).unwrap(), 1);
        let fetched = storage.fetch(window, RaceType::World).await.unwrap();
        assert_eq!(fetched, vec![record()]);
    }
}
