//! `racecal watch` - runs ingest and sync on a schedule until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use racecal_sync::{
    CycleOutcome, IngestReport, Ingestor, Scheduler, SchedulerConfig, SyncConfig,
    SyncOrchestrator, SyncReport,
};
use tracing::{info, warn};

use super::{Ports, today_jst};
use crate::config::ClientConfig;
use crate::error::ClientResult;

pub async fn run(config: &ClientConfig) -> ClientResult<()> {
    let sync = config.sync.to_sync_config();
    sync.validate()?;

    let ports = Ports::open(config);
    let orchestrator = Arc::new(ports.orchestrator(config, &sync)?);
    let ingestor = Arc::new(ports.ingestor(&sync));

    let scheduler = Scheduler::new(SchedulerConfig::new(sync.sync_interval));
    let handle = scheduler.handle();
    let sync = Arc::new(sync);

    let task = tokio::spawn(scheduler.run(move || {
        let ingestor = ingestor.clone();
        let orchestrator = orchestrator.clone();
        let sync = sync.clone();
        async move { run_cycle(&ingestor, &orchestrator, &sync, today_jst()).await }
    }));

    tokio::signal::ctrl_c().await?;
    info!("Interrupted, stopping scheduler");
    if let Err(e) = handle.stop().await {
        warn!(error = %e, "Failed to stop scheduler");
    }
    if tokio::time::timeout(Duration::from_secs(5), task).await.is_err() {
        warn!("Scheduler did not stop in time");
    }
    Ok(())
}

/// One scheduled cycle: ingest the window starting `first_day`, then sync it.
pub(crate) async fn run_cycle(
    ingestor: &Ingestor,
    orchestrator: &SyncOrchestrator,
    sync: &SyncConfig,
    first_day: NaiveDate,
) -> CycleOutcome {
    let window = match sync.window_from(first_day) {
        Ok(window) => window,
        Err(e) => return CycleOutcome::Failed(e.to_string()),
    };
    let ingest = ingestor.ingest(&window.local_dates(), &sync.race_types).await;
    let report = orchestrator.sync(&window, &sync.race_types).await;
    cycle_outcome(&ingest, &report)
}

fn cycle_outcome(ingest: &IngestReport, report: &SyncReport) -> CycleOutcome {
    if !report.race_types.is_empty() && report.race_types.iter().all(|o| o.aborted) {
        return CycleOutcome::Failed("no race type could be read from storage and calendar".into());
    }
    match ingest.summary.failure_count + report.totals().failure_count {
        0 => CycleOutcome::Clean,
        failures => CycleOutcome::Partial { failures },
    }
}
