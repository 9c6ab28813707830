//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use pipeline_telemetry_config::{
    TelemetryEnv, load_telemetry_config_from_path, to_pretty_json, to_pretty_toml,
};
use pipeline_telemetry_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<String> {
    let env = TelemetryEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let config = load_telemetry_config_from_path(config_path, &env)?;
    to_pretty_json(&config)
}

/// Same as [`load_effective_config_json`], rendered as TOML.
pub fn load_effective_config_toml(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<String> {
    let env = TelemetryEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let config = load_telemetry_config_from_path(config_path, &env)?;
    to_pretty_toml(&config)
}
