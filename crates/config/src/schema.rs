//! Telemetry configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims strings and lowercases the log level.

use pipeline_telemetry_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default on-disk database location for the `sqlite` provider.
pub const DEFAULT_SQLITE_PATH: &str = ".pipeline-telemetry/telemetry.db";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct TelemetryConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Storage backend settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TelemetryConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedTelemetryConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }

        self.storage.normalize_and_validate()?;
        self.logging.normalize_and_validate()?;
        Ok(ValidatedTelemetryConfig { raw: self })
    }
}

/// Validated config wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTelemetryConfig {
    raw: TelemetryConfig,
}

impl ValidatedTelemetryConfig {
    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> TelemetryConfig {
        self.raw
    }
}

impl AsRef<TelemetryConfig> for ValidatedTelemetryConfig {
    fn as_ref(&self) -> &TelemetryConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedTelemetryConfig {
    type Target = TelemetryConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// Process-local rows; nothing survives the process.
    Memory,
    /// Embedded `SQLite` database file.
    #[default]
    Sqlite,
}

impl StorageProvider {
    /// Parse a provider name (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Lowercase provider name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StorageProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StorageConfig {
    /// Backend to use.
    pub provider: StorageProvider,
    /// Database file for the `sqlite` provider.
    pub sqlite_path: Box<str>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::default(),
            sqlite_path: DEFAULT_SQLITE_PATH.into(),
        }
    }
}

impl StorageConfig {
    fn normalize_and_validate(&mut self) -> Result<(), ConfigSchemaError> {
        let trimmed = self.sqlite_path.trim();
        if trimmed.len() != self.sqlite_path.len() {
            self.sqlite_path = trimmed.into();
        }
        if self.provider == StorageProvider::Sqlite && self.sqlite_path.is_empty() {
            return Err(ConfigSchemaError::EmptyValue {
                section: "storage",
                field: "sqlitePath",
            });
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    #[default]
    Text,
}

impl LogFormat {
    /// Parse a format name (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    /// Lowercase format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: Box<str>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: DEFAULT_LOG_LEVEL.into(),
        }
    }
}

impl LoggingConfig {
    fn normalize_and_validate(&mut self) -> Result<(), ConfigSchemaError> {
        let mut level = self.level.trim().to_ascii_lowercase();
        if level == "warning" {
            level = "warn".to_string();
        }
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigSchemaError::InvalidLogLevel {
                value: self.level.to_string(),
            });
        }
        self.level = level.into_boxed_str();
        Ok(())
    }
}

/// Parse a telemetry config from a JSON string, applying validation and normalization.
pub fn parse_telemetry_config_json(input: &str) -> Result<ValidatedTelemetryConfig, ErrorEnvelope> {
    let config: TelemetryConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::config("invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a telemetry config from a TOML string, applying validation and normalization.
pub fn parse_telemetry_config_toml(input: &str) -> Result<ValidatedTelemetryConfig, ErrorEnvelope> {
    let config: TelemetryConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::config("invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Schema validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    #[error("config version {found} is not supported (expected {supported})")]
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A required string was empty after trimming.
    #[error("{section}.{field} must be non-empty")]
    EmptyValue {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
    },
    /// The log level is not one of the known names.
    #[error("logging.level must be one of trace, debug, info, warn, error")]
    InvalidLogLevel {
        /// Raw input value.
        value: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::config("unsupported_config_version"),
            Self::EmptyValue { .. } => ErrorCode::config("empty_value"),
            Self::InvalidLogLevel { .. } => ErrorCode::config("invalid_log_level"),
        }
    }
}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::EmptyValue { section, field } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field),
            ConfigSchemaError::InvalidLogLevel { value } => envelope
                .with_metadata("section", "logging")
                .with_metadata("field", "level")
                .with_metadata("value", value),
        }
    }
}
