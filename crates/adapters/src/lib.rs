//! # pipeline-telemetry-adapters
//!
//! Adapter implementations for ports (storage backends, loggers, validators).
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod log_sink;
pub mod logger;
pub mod storage;
pub mod tracing_logger;
pub mod validator;

pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use storage::{InMemoryTelemetryStorage, SCHEMA_VERSION, SqliteTelemetryStorage};
pub use tracing_logger::TracingLogger;
pub use validator::RequiredKeysValidator;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
