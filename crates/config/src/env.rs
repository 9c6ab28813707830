//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a variable that is present but empty or holds an
//! unknown enum value fails fast instead of being ignored.

use crate::schema::{
    LogFormat, StorageProvider, TelemetryConfig, ValidatedTelemetryConfig,
};
use pipeline_telemetry_shared::{ErrorCode, ErrorEnvelope, redact_if_secret};
use std::collections::BTreeMap;

/// Env var: storage provider (`memory` | `sqlite`).
pub const ENV_STORAGE_PROVIDER: &str = "PIPELINE_TELEMETRY_STORAGE_PROVIDER";
/// Env var: `SQLite` database path.
pub const ENV_SQLITE_PATH: &str = "PIPELINE_TELEMETRY_SQLITE_PATH";
/// Env var: minimum log level.
pub const ENV_LOG_LEVEL: &str = "PIPELINE_TELEMETRY_LOG_LEVEL";
/// Env var: log format (`json` | `text`).
pub const ENV_LOG_FORMAT: &str = "PIPELINE_TELEMETRY_LOG_FORMAT";

const ALL_VARS: [&str; 4] = [ENV_STORAGE_PROVIDER, ENV_SQLITE_PATH, ENV_LOG_LEVEL, ENV_LOG_FORMAT];

/// Parsed env overrides. `None` means the variable was not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryEnv {
    /// Storage provider override.
    pub storage_provider: Option<StorageProvider>,
    /// `SQLite` path override.
    pub sqlite_path: Option<Box<str>>,
    /// Log level override (validated with the rest of the config).
    pub log_level: Option<Box<str>>,
    /// Log format override.
    pub log_format: Option<LogFormat>,
}

impl TelemetryEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            storage_provider: parse_optional_enum(map, ENV_STORAGE_PROVIDER, StorageProvider::parse)?,
            sqlite_path: parse_optional_trimmed_string(map, ENV_SQLITE_PATH)?,
            log_level: parse_optional_trimmed_string(map, ENV_LOG_LEVEL)?,
            log_format: parse_optional_enum(map, ENV_LOG_FORMAT, LogFormat::parse)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ALL_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }

        Self::from_map(&map)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: TelemetryConfig,
    env: &TelemetryEnv,
) -> Result<ValidatedTelemetryConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(provider) = env.storage_provider {
        config.storage.provider = provider;
    }
    if let Some(path) = &env.sqlite_path {
        config.storage.sqlite_path = path.clone();
    }
    if let Some(level) = &env.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = env.log_format {
        config.logging.format = format;
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Env parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    #[error("{var} must be non-empty")]
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Enum env var had an invalid value.
    #[error("{var} has an unsupported value")]
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::config("empty_env_var"),
            Self::InvalidEnum { .. } => ErrorCode::config("invalid_env_enum"),
        }
    }
}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_if_secret(var, &value)),
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    parse(&raw).map(Some).ok_or_else(|| EnvParseError::InvalidEnum {
        var,
        value: raw.into_string(),
    })
}
