//! Aggregate command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, load_runtime_config, log_info, to_pretty_json_line};
use chrono::NaiveDate;
use pipeline_telemetry_domain::TelemetrySelector;
use pipeline_telemetry_infra::{
    AggregateRequest, AggregationFlavor, AggregationSummary, YesterdayMode, run_aggregate_local,
    run_aggregate_yesterday_local,
};
use std::fmt::Write as _;
use std::path::Path;

/// Run one aggregation flavor over `[from, to]`.
pub fn run_aggregate_span(
    mode: OutputMode,
    config_path: Option<&Path>,
    flavor: AggregationFlavor,
    selector: TelemetrySelector,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<CliOutput, CliError> {
    if from > to {
        return Err(CliError::ReversedSpan { from, to });
    }
    let config = load_runtime_config(mode, config_path)?;

    let request = AggregateRequest {
        flavor,
        selector,
        from,
        to,
    };
    let summary = run_aggregate_local(&config, &request)?;
    format_summary(mode, flavor.as_str(), &summary)
}

/// Run the daily rollup of yesterday.
pub fn run_aggregate_yesterday(
    mode: OutputMode,
    config_path: Option<&Path>,
    selector: TelemetrySelector,
    yesterday_mode: YesterdayMode,
) -> Result<CliOutput, CliError> {
    let config = load_runtime_config(mode, config_path)?;

    let summary = run_aggregate_yesterday_local(&config, selector, yesterday_mode)?;
    format_summary(mode, AggregationFlavor::Daily.as_str(), &summary)
}

fn format_summary(
    mode: OutputMode,
    aggregation: &str,
    summary: &AggregationSummary,
) -> Result<CliOutput, CliError> {
    let mut stderr = String::new();
    log_info(&mut stderr, "aggregate completed", mode.no_progress);

    let stdout = if mode.is_json() {
        to_pretty_json_line(&serde_json::json!({
            "status": "ok",
            "aggregation": aggregation,
            "summary": summary,
        }))?
    } else {
        let mut out = String::new();
        let _ = writeln!(out, "status: ok");
        let _ = writeln!(out, "aggregation: {aggregation}");
        let _ = writeln!(out, "telemetryType: {}", summary.telemetry_type);
        let _ = writeln!(out, "selector: {}", summary.selector);
        let _ = writeln!(out, "windows: {}", summary.windows.len());
        let _ = writeln!(out, "sourceRecords: {}", summary.total_source_records());
        for window in &summary.windows {
            let _ = writeln!(
                out,
                "  {} records={} replaced={}",
                window.range, window.source_records, window.replaced
            );
        }
        out
    };

    Ok(CliOutput::ok(stdout, stderr))
}
