//! `racecal sync`.

use std::fmt::Write as _;

use racecal_providers::OperationFailure;
use racecal_sync::SyncReport;
use tracing::info;

use super::{Ports, describe_window, resolve_window};
use crate::cli::WindowArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

pub async fn run(
    config: &ClientConfig,
    window: &WindowArgs,
    dry_run: bool,
    json: bool,
) -> ClientResult<()> {
    let (sync, window) = resolve_window(config, window)?;
    let sync = sync.with_dry_run(dry_run);
    let ports = Ports::open(config);
    info!(
        calendar = %config.calendar_path().display(),
        storage = %config.storage_dir().display(),
        "Syncing"
    );

    let report = ports
        .orchestrator(config, &sync)?
        .sync(&window, &sync.race_types)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }

    match report.totals().failure_count {
        0 => Ok(()),
        failures => Err(ClientError::Incomplete { failures }),
    }
}

/// Human-readable report, one line per race type.
pub fn render(report: &SyncReport) -> String {
    let mut out = String::new();
    let mode = if report.dry_run { " (dry run)" } else { "" };
    let _ = writeln!(out, "Sync {}{}", describe_window(&report.window), mode);

    for outcome in &report.race_types {
        if outcome.aborted {
            let _ = writeln!(out, "  {:<9} aborted", outcome.race_type.prefix());
        } else {
            let _ = writeln!(
                out,
                "  {:<9} {} eligible, {} to delete, {} to upsert, {} ok, {} failed",
                outcome.race_type.prefix(),
                outcome.eligible,
                outcome.planned_deletes,
                outcome.planned_upserts,
                outcome.summary.success_count,
                outcome.summary.failure_count,
            );
        }
        render_failures(&mut out, &outcome.summary.failures);
    }
    out
}

pub(crate) fn render_failures(out: &mut String, failures: &[OperationFailure]) {
    for failure in failures {
        let _ = writeln!(
            out,
            "    {} {}: {}",
            failure.resource, failure.id, failure.reason
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use racecal_core::{RaceType, TimeWindow};
    use racecal_providers::{OperationSummary, Resource};
    use racecal_sync::RaceTypeOutcome;

    fn report() -> SyncReport {
        let mut jra = OperationSummary::new();
        jra.record_success();
        jra.record_success();
        jra.record_failure(Resource::Calendar, "jra202412220611", "not found");

        let mut keirin = OperationSummary::new();
        keirin.record_failure(Resource::Storage, "keirin", "storage offline");

        SyncReport {
            window: TimeWindow::for_local_days(NaiveDate::from_ymd_opt(2024, 12, 22).unwrap(), 2),
            dry_run: false,
            race_types: vec![
                RaceTypeOutcome {
                    race_type: RaceType::Jra,
                    eligible: 2,
                    planned_deletes: 1,
                    planned_upserts: 2,
                    aborted: false,
                    summary: jra,
                },
                RaceTypeOutcome {
                    race_type: RaceType::Keirin,
                    eligible: 0,
                    planned_deletes: 0,
                    planned_upserts: 0,
                    aborted: true,
                    summary: keirin,
                },
            ],
        }
    }

    #[test]
    fn render_report() {
        insta::assert_snapshot!(render(&report()), @r"
        Sync 2024-12-22 to 2024-12-23
          jra       2 eligible, 1 to delete, 2 to upsert, 2 ok, 1 failed
            calendar jra202412220611: not found
          keirin    aborted
            storage keirin: storage offline
        ");
    }

    #[test]
    fn render_dry_run() {
        let mut report = report();
        report.dry_run = true;
        report.race_types.truncate(0);
        insta::assert_snapshot!(render(&report), @"Sync 2024-12-22 to 2024-12-23 (dry run)");
    }
}
