//! Records command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, load_runtime_config, log_info, to_pretty_json_line};
use chrono::NaiveDate;
use pipeline_telemetry_domain::{TelemetrySelector, TelemetryType};
use pipeline_telemetry_infra::{RecordsRequest, list_records_local};
use std::fmt::Write as _;
use std::path::Path;

/// List stored records of one type and stream started in `[from, to)`.
pub fn run_records_list(
    mode: OutputMode,
    config_path: Option<&Path>,
    telemetry_type: TelemetryType,
    selector: TelemetrySelector,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<CliOutput, CliError> {
    let config = load_runtime_config(mode, config_path)?;

    let request = RecordsRequest {
        telemetry_type,
        selector,
        from,
        to,
    };
    let models = list_records_local(&config, &request)?;

    let mut stderr = String::new();
    log_info(&mut stderr, "records list completed", mode.no_progress);

    let stdout = if mode.is_json() {
        to_pretty_json_line(&serde_json::json!({
            "status": "ok",
            "count": models.len(),
            "records": models,
        }))?
    } else {
        let mut out = String::new();
        let _ = writeln!(out, "status: ok");
        let _ = writeln!(out, "count: {}", models.len());
        for model in &models {
            let run_time = model
                .run_time_in_seconds
                .map_or_else(|| "-".to_string(), |seconds| format!("{seconds}"));
            let _ = writeln!(
                out,
                "  {} {} light={} runTime={run_time} ioTime={} subProcesses={}",
                model.start_date_time,
                model.telemetry_type,
                model.traffic_light,
                model.io_time_in_seconds,
                model.telemetry.len()
            );
        }
        out
    };

    Ok(CliOutput::ok(stdout, stderr))
}
