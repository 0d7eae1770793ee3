//! `racecal ingest`.

use std::fmt::Write as _;

use racecal_sync::IngestReport;
use tracing::info;

use super::sync::render_failures;
use super::{Ports, describe_window, resolve_window};
use crate::cli::WindowArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

pub async fn run(config: &ClientConfig, window: &WindowArgs, json: bool) -> ClientResult<()> {
    let (sync, window) = resolve_window(config, window)?;
    let ports = Ports::open(config);
    info!(
        source = %config.source_dir().display(),
        window = %describe_window(&window),
        "Ingesting"
    );

    let report = ports
        .ingestor(&sync)
        .ingest(&window.local_dates(), &sync.race_types)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }

    match report.summary.failure_count {
        0 => Ok(()),
        failures => Err(ClientError::Incomplete { failures }),
    }
}

pub fn render(report: &IngestReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Ingested {} of {} rows: {} stored, {} failed",
        report.normalized,
        report.fetched,
        report.summary.success_count,
        report.summary.failure_count,
    );
    render_failures(&mut out, &report.summary.failures);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use racecal_providers::Resource;

    #[test]
    fn render_report() {
        let mut report = IngestReport {
            fetched: 3,
            normalized: 2,
            ..IngestReport::default()
        };
        report.summary.record_success();
        report.summary.record_success();
        report
            .summary
            .record_failure(Resource::Source, "nar/20250105/#44/XR", "invalid race number: XR");

        insta::assert_snapshot!(render(&report), @r"
        Ingested 2 of 3 rows: 2 stored, 1 failed
            source nar/20250105/#44/XR: invalid race number: XR
        ");
    }
}
