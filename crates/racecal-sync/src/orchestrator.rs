//! One sync cycle across the configured race types.
//!
//! Per race type: fetch desired records from storage, keep the eligible ones,
//! list existing calendar events, reconcile, then apply deletes followed by
//! upserts. Every port failure is recorded and the cycle moves on; a failure
//! in one race type never stops the others.
//!
//! If the storage fetch or the calendar listing fails, that race type is
//! skipped entirely: an unknown state is never mistaken for an empty one, so
//! no deletes are planned from it.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use racecal_core::{CalendarEvent, EligibilityFilter, RaceId, RaceType, TimeWindow};
use racecal_providers::{CalendarPort, OperationSummary, Resource, StoragePort};
use serde::Serialize;
use tracing::{info, warn};

use crate::reconcile::reconcile;

/// Behaviour switches for a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Run race types concurrently.
    pub parallel_race_types: bool,
    /// Plan without calling any mutating calendar method.
    pub dry_run: bool,
}

/// What happened to one race type during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceTypeOutcome {
    pub race_type: RaceType,
    /// Records that passed the eligibility filter.
    pub eligible: usize,
    pub planned_deletes: usize,
    pub planned_upserts: usize,
    /// True if storage or calendar could not be read and nothing was planned.
    pub aborted: bool,
    pub summary: OperationSummary,
}

impl RaceTypeOutcome {
    fn new(race_type: RaceType) -> Self {
        Self {
            race_type,
            eligible: 0,
            planned_deletes: 0,
            planned_upserts: 0,
            aborted: false,
            summary: OperationSummary::new(),
        }
    }
}

/// Result of a full cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub window: TimeWindow,
    pub dry_run: bool,
    /// One entry per race type, in configured order.
    pub race_types: Vec<RaceTypeOutcome>,
}

impl SyncReport {
    pub fn outcome(&self, race_type: RaceType) -> Option<&RaceTypeOutcome> {
        self.race_types.iter().find(|o| o.race_type == race_type)
    }

    /// Sum of every race type's summary.
    pub fn totals(&self) -> OperationSummary {
        let mut totals = OperationSummary::new();
        for outcome in &self.race_types {
            totals.merge(outcome.summary.clone());
        }
        totals
    }

    pub fn has_failures(&self) -> bool {
        self.race_types.iter().any(|o| !o.summary.is_clean())
    }
}

/// Drives sync cycles against injected storage and calendar ports.
pub struct SyncOrchestrator {
    storage: Arc<dyn StoragePort>,
    calendar: Arc<dyn CalendarPort>,
    filter: EligibilityFilter,
    options: SyncOptions,
}

impl SyncOrchestrator {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        calendar: Arc<dyn CalendarPort>,
        filter: EligibilityFilter,
    ) -> Self {
        Self {
            storage,
            calendar,
            filter,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Runs one cycle over `race_types` for `window`.
    pub async fn sync(&self, window: &TimeWindow, race_types: &[RaceType]) -> SyncReport {
        info!(
            race_types = race_types.len(),
            parallel = self.options.parallel_race_types,
            dry_run = self.options.dry_run,
            "Starting sync cycle"
        );

        let race_types_report = if self.options.parallel_race_types {
            join_all(
                race_types
                    .iter()
                    .map(|rt| self.sync_race_type(window.clone(), *rt)),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(race_types.len());
            for race_type in race_types {
                outcomes.push(self.sync_race_type(window.clone(), *race_type).await);
            }
            outcomes
        };

        let report = SyncReport {
            window: window.clone(),
            dry_run: self.options.dry_run,
            race_types: race_types_report,
        };
        let totals = report.totals();
        info!(
            succeeded = totals.success_count,
            failed = totals.failure_count,
            "Sync cycle finished"
        );
        report
    }

    #[tracing::instrument(skip_all, fields(race_type = %race_type))]
    async fn sync_race_type(&self, window: TimeWindow, race_type: RaceType) -> RaceTypeOutcome {
        let mut outcome = RaceTypeOutcome::new(race_type);

        let desired = match self.storage.fetch(window.clone(), race_type).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Storage fetch failed, skipping race type");
                outcome.summary.record_error(Resource::Storage, race_type.prefix(), &e);
                outcome.aborted = true;
                return outcome;
            }
        };
        let eligible = self.filter.filter(desired);
        outcome.eligible = eligible.len();

        let existing = match self.calendar.list(window, race_type).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Calendar listing failed, skipping race type");
                outcome.summary.record_error(Resource::Calendar, race_type.prefix(), &e);
                outcome.aborted = true;
                return outcome;
            }
        };
        let existing_ids: HashSet<RaceId> = existing.iter().map(|e| e.id.clone()).collect();

        let plan = reconcile(eligible, existing, race_type);
        outcome.planned_deletes = plan.to_delete.len();
        outcome.planned_upserts = plan.to_upsert.len();

        if self.options.dry_run {
            info!(
                deletes = outcome.planned_deletes,
                upserts = outcome.planned_upserts,
                "Dry run, calendar left untouched"
            );
            return outcome;
        }

        for event in plan.to_delete {
            let id = event.id;
            match self.calendar.delete(id.clone()).await {
                Ok(()) => outcome.summary.record_success(),
                Err(e) => outcome.summary.record_error(Resource::Calendar, id.as_str(), &e),
            }
        }

        for record in plan.to_upsert {
            let event = CalendarEvent::from_record(&record);
            let id = event.id.to_string();
            let result = if existing_ids.contains(record.id()) {
                self.calendar.update(event).await
            } else {
                self.calendar.insert(event).await
            };
            match result {
                Ok(()) => outcome.summary.record_success(),
                Err(e) => outcome.summary.record_error(Resource::Calendar, id, &e),
            }
        }

        info!(
            succeeded = outcome.summary.success_count,
            failed = outcome.summary.failure_count,
            "Race type synced"
        );
        outcome
    }
}
