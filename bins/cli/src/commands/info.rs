//! Info command handler.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, to_pretty_json_line};
use pipeline_telemetry_infra::infra_crate_version;

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let stdout = if mode.is_json() {
        to_pretty_json_line(&serde_json::json!({
            "status": "ok",
            "name": name,
            "version": version,
            "infraVersion": infra_crate_version(),
        }))?
    } else {
        format!("name: {name}\nversion: {version}\ninfraVersion: {}\n", infra_crate_version())
    };

    Ok(CliOutput::ok(stdout, String::new()))
}
