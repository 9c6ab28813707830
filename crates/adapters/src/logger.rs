//! Structured JSON logger adapter.

use crate::log_sink::LogSink;
use pipeline_telemetry_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use pipeline_telemetry_shared::{REDACTED, is_secret_key};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// JSON logger emitting one line per event.
#[derive(Clone)]
pub struct JsonLogger {
    sink: Arc<dyn LogSink>,
    base_fields: LogFields,
    min_level: LogLevel,
}

impl JsonLogger {
    /// Create a JSON logger backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_fields: LogFields::new(),
            min_level: LogLevel::Info,
        }
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Set the minimum log level.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }
}

impl LoggerPort for JsonLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }

        let mut fields = self.base_fields.clone();
        if let Some(extra) = event.fields {
            fields.extend(extra);
        }
        redact_fields(&mut fields);

        let mut error = event.error;
        if let Some(ref mut value) = error {
            redact_value(value);
        }

        let mut payload = serde_json::Map::new();
        payload.insert("timestampMs".to_string(), Value::from(now_epoch_ms()));
        payload.insert(
            "level".to_string(),
            Value::String(event.level.as_str().to_string()),
        );
        payload.insert("event".to_string(), Value::String(event.event.to_string()));
        payload.insert(
            "message".to_string(),
            Value::String(event.message.to_string()),
        );
        if !fields.is_empty() {
            payload.insert("fields".to_string(), fields_to_json(&fields));
        }
        if let Some(error) = error {
            payload.insert("error".to_string(), error);
        }

        let line = serde_json::to_string(&Value::Object(payload)).map_or_else(
            |_| {
                "{\"timestampMs\":0,\"level\":\"error\",\"event\":\"logger.serialize_failed\",\"message\":\"log serialization failed\"}\n"
                    .to_string()
            },
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        );
        self.sink.write_line(&line);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            sink: Arc::clone(&self.sink),
            base_fields: merged,
            min_level: self.min_level,
        })
    }
}

pub(crate) fn fields_to_json(fields: &LogFields) -> Value {
    let map = fields
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    Value::Object(map)
}

pub(crate) fn redact_fields(fields: &mut LogFields) {
    for (key, value) in fields.iter_mut() {
        if is_secret_key(key) {
            *value = Value::String(REDACTED.to_string());
        } else {
            redact_value(value);
        }
    }
}

pub(crate) fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_secret_key(key) {
                    *nested = Value::String(REDACTED.to_string());
                } else {
                    redact_value(nested);
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                redact_value(item);
            }
        },
        _ => {},
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::MemoryLogSink;
    use serde_json::json;

    fn field(key: &str, value: Value) -> (Box<str>, Value) {
        (key.to_owned().into_boxed_str(), value)
    }

    #[test]
    fn json_logger_redacts_sensitive_payloads() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Debug);

        let fields: LogFields = [
            field("sourceToken", json!("abc")),
            field("subProcess", json!("DATA_STORAGE")),
            field("payload", json!({ "api_key": "k", "rows": 3 })),
        ]
        .into_iter()
        .collect();

        logger.log(LogEvent {
            event: "telemetry.add_data".into(),
            level: LogLevel::Info,
            message: "data added".into(),
            fields: Some(fields),
            error: None,
        });

        let lines = sink.take();
        assert_eq!(lines.len(), 1);
        let payload: Value = serde_json::from_str(lines[0].trim())?;
        assert_eq!(payload.pointer("/fields/sourceToken"), Some(&json!(REDACTED)));
        assert_eq!(
            payload.pointer("/fields/subProcess"),
            Some(&json!("DATA_STORAGE"))
        );
        assert_eq!(
            payload.pointer("/fields/payload/api_key"),
            Some(&json!(REDACTED))
        );
        assert_eq!(payload.pointer("/fields/payload/rows"), Some(&json!(3)));
        assert_eq!(payload.get("event"), Some(&json!("telemetry.add_data")));
        Ok(())
    }

    #[test]
    fn min_level_filters_and_child_merges_fields() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Info);
        logger.debug("aggregate.range.start", "hidden", None);

        let child = logger.child([field("telemetryType", json!("DAILY_AGGR"))].into());
        child.info("aggregate.range.done", "stored", None);

        let lines = sink.take();
        assert_eq!(lines.len(), 1);
        let payload: Value = serde_json::from_str(lines[0].trim())?;
        assert_eq!(
            payload.pointer("/fields/telemetryType"),
            Some(&json!("DAILY_AGGR"))
        );
        assert_eq!(payload.get("level"), Some(&json!("info")));
        Ok(())
    }
}
