//! # pipeline-telemetry-config
//!
//! Configuration schema, validation, and normalization for storage and
//! logging. This crate depends on `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (file + env).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_SQLITE_PATH, ENV_STORAGE_PROVIDER, EnvParseError,
    TelemetryEnv, apply_env_overrides,
};
pub use load::{
    load_telemetry_config_from_path, load_telemetry_config_std_env, to_pretty_json,
    to_pretty_toml,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, DEFAULT_LOG_LEVEL, DEFAULT_SQLITE_PATH, LogFormat,
    LoggingConfig, StorageConfig, StorageProvider, TelemetryConfig, ValidatedTelemetryConfig,
    parse_telemetry_config_json, parse_telemetry_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
