//! # pipeline-telemetry-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Local CLI orchestration helpers.
pub mod cli_local;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Logger adapter selection helpers.
mod logger_factory;
/// Storage adapter selection helpers.
mod storage_factory;

pub use cli_local::{
    AggregateRequest, AggregationFlavor, RecordsRequest, YesterdayMode, list_records,
    list_records_local, run_aggregate, run_aggregate_local, run_aggregate_yesterday_local,
};
pub use config_check::{load_effective_config_json, load_effective_config_toml};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use logger_factory::build_logger;
pub use storage_factory::build_storage;

pub use pipeline_telemetry_app::{AggregationSummary, WindowSummary};

// Re-export redaction utilities for CLI boundary sanitization
pub use pipeline_telemetry_shared::{is_secret_key, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
