//! Logger adapter that forwards events to the `tracing` subscriber.

use crate::logger::{fields_to_json, redact_fields, redact_value};
use pipeline_telemetry_ports::{LogEvent, LogFields, LogLevel, LoggerPort};

/// Target used for every forwarded event.
pub const TRACING_TARGET: &str = "pipeline_telemetry";

/// `LoggerPort` implementation backed by `tracing` macros.
///
/// Filtering is left to the installed subscriber (`RUST_LOG` / `EnvFilter`).
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    base_fields: LogFields,
}

impl TracingLogger {
    /// Create a logger without base fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let mut fields = self.base_fields.clone();
        if let Some(extra) = event.fields {
            fields.extend(extra);
        }
        redact_fields(&mut fields);
        let fields = fields_to_json(&fields).to_string();

        let mut error = event.error;
        if let Some(ref mut value) = error {
            redact_value(value);
        }
        let error = error.map(|value| value.to_string()).unwrap_or_default();

        let name = event.event.as_ref();
        let message = event.message.as_ref();
        match event.level {
            LogLevel::Debug => {
                tracing::debug!(target: TRACING_TARGET, event = name, fields = %fields, "{message}");
            },
            LogLevel::Info => {
                tracing::info!(target: TRACING_TARGET, event = name, fields = %fields, "{message}");
            },
            LogLevel::Warn => {
                tracing::warn!(target: TRACING_TARGET, event = name, fields = %fields, "{message}");
            },
            LogLevel::Error => {
                tracing::error!(
                    target: TRACING_TARGET,
                    event = name,
                    fields = %fields,
                    error = %error,
                    "{message}"
                );
            },
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            base_fields: merged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn field(key: &str, value: serde_json::Value) -> (Box<str>, serde_json::Value) {
        (key.to_owned().into_boxed_str(), value)
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Ok(mut bytes) = self.0.lock() {
                bytes.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn forwards_events_with_redacted_fields() -> Result<(), Box<dyn std::error::Error>> {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let logger = TracingLogger::new().child([field("dbPassword", json!("hunter2"))].into());
            logger.info(
                "aggregate.range.done",
                "window stored",
                Some([field("telemetryType", json!("WEEKLY_AGGR"))].into()),
            );
        });

        let bytes = captured.0.lock().map_err(|_| "poisoned")?.clone();
        let output = String::from_utf8(bytes)?;
        assert!(output.contains("aggregate.range.done"));
        assert!(output.contains("WEEKLY_AGGR"));
        assert!(output.contains("window stored"));
        assert!(!output.contains("hunter2"));
        Ok(())
    }
}
