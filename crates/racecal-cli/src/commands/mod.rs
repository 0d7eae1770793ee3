//! Command implementations.

pub mod config;
pub mod id;
pub mod ingest;
pub mod sync;
pub mod watch;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use racecal_core::{EligibilityFilter, TimeWindow, jst};
use racecal_providers::{
    CalendarPort, FileCalendar, FileRaceSource, FileStorage, LoggedCalendar, LoggedStorage,
    RaceSource, StoragePort,
};
use racecal_sync::{IngestOptions, Ingestor, SyncConfig, SyncOptions, SyncOrchestrator};

use crate::cli::WindowArgs;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// The configured ports, wrapped in logging middleware.
pub(crate) struct Ports {
    pub storage: Arc<dyn StoragePort>,
    pub calendar: Arc<dyn CalendarPort>,
    pub source: Arc<dyn RaceSource>,
}

impl Ports {
    pub fn open(config: &ClientConfig) -> Self {
        Self {
            storage: Arc::new(LoggedStorage::new(FileStorage::new(config.storage_dir()))),
            calendar: Arc::new(LoggedCalendar::new(FileCalendar::new(config.calendar_path()))),
            source: Arc::new(FileRaceSource::new(config.source_dir())),
        }
    }

    pub fn orchestrator(
        &self,
        config: &ClientConfig,
        sync: &SyncConfig,
    ) -> ClientResult<SyncOrchestrator> {
        let filter = EligibilityFilter::new(config.display_grades()?);
        Ok(
            SyncOrchestrator::new(self.storage.clone(), self.calendar.clone(), filter).with_options(
                SyncOptions {
                    parallel_race_types: sync.parallel_race_types,
                    dry_run: sync.dry_run,
                },
            ),
        )
    }

    pub fn ingestor(&self, sync: &SyncConfig) -> Ingestor {
        Ingestor::new(
            self.source.clone(),
            self.storage.clone(),
            IngestOptions::from(sync),
        )
    }
}

/// Today in Japan.
pub(crate) fn today_jst() -> NaiveDate {
    Utc::now().with_timezone(&jst()).date_naive()
}

/// Applies command-line overrides to the configured sync settings and
/// returns them with the window they select.
pub(crate) fn resolve_window(
    config: &ClientConfig,
    args: &WindowArgs,
) -> ClientResult<(SyncConfig, TimeWindow)> {
    let mut sync = config.sync.to_sync_config();
    if let Some(days) = args.days {
        sync = sync.with_window_days(days);
    }
    if !args.race_types.is_empty() {
        sync = sync.with_race_types(args.race_types.iter().copied());
    }
    sync.validate()?;
    let window = sync.window_from(args.from.unwrap_or_else(today_jst))?;
    Ok((sync, window))
}

/// Describes the local days a window covers.
pub(crate) fn describe_window(window: &TimeWindow) -> String {
    let dates = window.local_dates();
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) if first == last => first.to_string(),
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "empty window".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use racecal_core::RaceType;
    use racecal_sync::SyncError;

    #[test]
    fn window_overrides() {
        let config = ClientConfig::default();
        let args = WindowArgs {
            from: NaiveDate::from_ymd_opt(2025, 3, 1),
            days: Some(2),
            race_types: vec![RaceType::Boatrace],
        };
        let (sync, window) = resolve_window(&config, &args).unwrap();
        assert_eq!(sync.race_types, vec![RaceType::Boatrace]);
        assert_eq!(describe_window(&window), "2025-03-01 to 2025-03-02");
    }

    #[test]
    fn window_defaults_to_config() {
        let mut config = ClientConfig::default();
        config.sync.window_days = 1;
        let args = WindowArgs {
            from: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..WindowArgs::default()
        };
        let (sync, window) = resolve_window(&config, &args).unwrap();
        assert_eq!(sync.race_types.len(), 6);
        assert_eq!(describe_window(&window), "2025-03-01");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = WindowArgs {
            days: Some(0),
            ..WindowArgs::default()
        };
        assert!(resolve_window(&ClientConfig::default(), &args).is_err());
    }

    #[test]
    fn start_date_past_the_supported_range() {
        let args = WindowArgs {
            from: Some(NaiveDate::MAX),
            ..WindowArgs::default()
        };
        let err = resolve_window(&ClientConfig::default(), &args).unwrap_err();
        assert!(matches!(err, ClientError::Sync(SyncError::Config { .. })), "{err:?}");
    }
}
