//! Config command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, ENV_PREFIX, collect_scoped_env, log_info, to_pretty_json_line};
use pipeline_telemetry_infra::{
    load_effective_config_json, load_effective_config_toml, validate_env_parsing,
};
use std::path::Path;

/// Print the effective config: JSON with `--output json`, TOML otherwise.
pub fn run_config_show(mode: OutputMode, path: Option<&Path>) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env(ENV_PREFIX);
    let rendered = if mode.is_json() {
        load_effective_config_json(&env, path)?
    } else {
        load_effective_config_toml(&env, path)?
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if mode.is_json() {
        let config_value: serde_json::Value = serde_json::from_str(rendered.trim())?;
        to_pretty_json_line(&serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": config_value,
        }))?
    } else {
        let mut out = String::from("status: ok\nconfig:\n");
        out.push_str(&rendered);
        out
    };

    Ok(CliOutput::ok(stdout, stderr))
}

/// Validate env overrides and the effective config without printing it.
pub fn run_config_check(mode: OutputMode, path: Option<&Path>) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env(ENV_PREFIX);
    validate_env_parsing(&env)?;
    load_effective_config_json(&env, path)?;

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let stdout = if mode.is_json() {
        to_pretty_json_line(&serde_json::json!({ "status": "ok" }))?
    } else {
        "status: ok\n".to_string()
    };
    Ok(CliOutput::ok(stdout, stderr))
}
