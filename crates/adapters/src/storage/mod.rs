//! Telemetry storage backends.
//!
//! - `memory`: process-local rows, used by tests and dry runs
//! - `sqlite`: embedded on-disk (or `:memory:`) store via `rusqlite`
//!
//! Both reject every operation once closed with `storage:storage_not_initialized`.

mod memory;
mod sqlite;

pub use memory::InMemoryTelemetryStorage;
pub use sqlite::SqliteTelemetryStorage;

use pipeline_telemetry_domain::TelemetryError;
use pipeline_telemetry_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Schema version stamped into `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

pub(crate) fn storage_error(backend: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::storage(backend),
        message.to_string(),
        ErrorClass::NonRetriable,
    )
}

pub(crate) fn not_initialized(backend: &str) -> ErrorEnvelope {
    TelemetryError::StorageNotInitialized {
        backend: backend.to_string(),
    }
    .into()
}

pub(crate) fn lock_poisoned(backend: &str) -> ErrorEnvelope {
    ErrorEnvelope::invariant(
        ErrorCode::storage(backend),
        format!("{backend} storage lock poisoned"),
    )
}
