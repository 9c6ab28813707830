//! Environment validation helpers for CLI surfaces.

use pipeline_telemetry_config::{TelemetryConfig, TelemetryEnv, apply_env_overrides};
use pipeline_telemetry_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Validate that the provided env overrides can be parsed and merged into a config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    let parsed = TelemetryEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let _ = apply_env_overrides(TelemetryConfig::default(), &parsed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_telemetry_config::ENV_STORAGE_PROVIDER;

    #[test]
    fn unknown_provider_is_rejected() {
        let env = BTreeMap::from([(ENV_STORAGE_PROVIDER.to_string(), "postgres".to_string())]);
        let result = validate_env_parsing(&env).map_err(|error| error.code.to_string());
        assert!(matches!(result, Err(code) if code == "config:invalid_env_enum"));
    }

    #[test]
    fn empty_env_is_valid() {
        assert!(validate_env_parsing(&BTreeMap::new()).is_ok());
    }
}
