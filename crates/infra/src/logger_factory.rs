//! Logger adapter selection.

use pipeline_telemetry_adapters::{JsonLogger, StderrLogSink, TracingLogger};
use pipeline_telemetry_config::{LogFormat, ValidatedTelemetryConfig};
use pipeline_telemetry_ports::{LogLevel, LoggerPort};
use std::sync::Arc;

/// Build the use-case logger for `config.logging`.
///
/// `text` routes events through `tracing`, so the subscriber installed by the
/// binary decides filtering. `json` writes one line per event to stderr and
/// filters at the configured level; `trace` maps to `debug`.
pub fn build_logger(config: &ValidatedTelemetryConfig) -> Arc<dyn LoggerPort> {
    match config.logging.format {
        LogFormat::Text => Arc::new(TracingLogger::new()),
        LogFormat::Json => Arc::new(
            JsonLogger::new(Arc::new(StderrLogSink)).with_min_level(min_level(&config.logging.level)),
        ),
    }
}

fn min_level(level: &str) -> LogLevel {
    LogLevel::parse(level).unwrap_or(LogLevel::Debug)
}
