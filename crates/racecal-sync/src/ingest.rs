//! Pulls raw races from a source into storage.
//!
//! Source calls are spaced by `source_fetch_delay`. A date whose fetch fails
//! is recorded as a failure and nothing is written for it; rows that fail to
//! normalize are recorded individually. Everything that normalized is
//! written in chunks.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use racecal_core::{RaceRecord, RaceType};
use racecal_providers::{
    OperationSummary, RaceSource, Resource, StoragePort, normalize_race, row_label, upsert_in_chunks,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;

/// Pacing for source calls and storage writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub source_fetch_delay: Duration,
    pub batch_size: usize,
    pub batch_pause: Duration,
}

impl From<&SyncConfig> for IngestOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            source_fetch_delay: config.source_fetch_delay,
            batch_size: config.batch_size,
            batch_pause: config.batch_pause,
        }
    }
}

/// Result of an ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Raw rows received from the source.
    pub fetched: usize,
    /// Rows that became valid records.
    pub normalized: usize,
    /// Source failures, normalization failures and storage writes.
    pub summary: OperationSummary,
}

impl IngestReport {
    pub fn has_failures(&self) -> bool {
        !self.summary.is_clean()
    }
}

pub struct Ingestor {
    source: Arc<dyn RaceSource>,
    storage: Arc<dyn StoragePort>,
    options: IngestOptions,
}

impl Ingestor {
    pub fn new(source: Arc<dyn RaceSource>, storage: Arc<dyn StoragePort>, options: IngestOptions) -> Self {
        Self {
            source,
            storage,
            options,
        }
    }

    /// Ingests every race type on every date.
    pub async fn ingest(&self, dates: &[NaiveDate], race_types: &[RaceType]) -> IngestReport {
        let mut report = IngestReport::default();
        let mut first_call = true;

        for race_type in race_types {
            let mut records: Vec<RaceRecord> = Vec::new();
            for date in dates {
                if !first_call && !self.options.source_fetch_delay.is_zero() {
                    tokio::time::sleep(self.options.source_fetch_delay).await;
                }
                first_call = false;
                records.extend(self.fetch_day(*date, *race_type, &mut report).await);
            }

            if records.is_empty() {
                debug!(%race_type, "Nothing to write");
                continue;
            }
            let written = upsert_in_chunks(
                self.storage.as_ref(),
                records,
                self.options.batch_size,
                self.options.batch_pause,
            )
            .await;
            info!(
                %race_type,
                written = written.success_count,
                failed = written.failure_count,
                "Stored races"
            );
            report.summary.merge(written);
        }

        report
    }

    async fn fetch_day(&self, date: NaiveDate, race_type: RaceType, report: &mut IngestReport) -> Vec<RaceRecord> {
        let rows = match self.source.fetch_races(date, race_type).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(%race_type, %date, error = %e, "Source fetch failed, date skipped");
                report.summary.record_error(
                    Resource::Source,
                    format!("{}/{}", race_type, date.format("%Y%m%d")),
                    &e,
                );
                return Vec::new();
            }
        };
        report.fetched += rows.len();

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match normalize_race(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(row = %row_label(row), error = %e, "Skipping row");
                    report
                        .summary
                        .record_failure(Resource::Source, row_label(row), e.to_string());
                }
            }
        }
        report.normalized += records.len();
        debug!(%race_type, %date, rows = rows.len(), records = records.len(), "Fetched source day");
        records
    }
}
