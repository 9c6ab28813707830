//! Storage adapter selection and initialization.

use crate::InfraResult;
use pipeline_telemetry_adapters::{InMemoryTelemetryStorage, SqliteTelemetryStorage};
use pipeline_telemetry_config::{StorageProvider, ValidatedTelemetryConfig};
use pipeline_telemetry_ports::TelemetryStoragePort;
use std::sync::Arc;

/// Build the storage port selected by `config.storage.provider`.
///
/// The `SQLite` file (and its parent directories) is created on first use.
pub fn build_storage(config: &ValidatedTelemetryConfig) -> InfraResult<Arc<dyn TelemetryStoragePort>> {
    match config.storage.provider {
        StorageProvider::Memory => {
            tracing::debug!(provider = "memory", "using in-memory telemetry storage");
            Ok(Arc::new(InMemoryTelemetryStorage::new()))
        },
        StorageProvider::Sqlite => {
            let path = config.storage.sqlite_path.as_ref();
            tracing::debug!(provider = "sqlite", path, "opening telemetry storage");
            Ok(Arc::new(SqliteTelemetryStorage::open(path)?))
        },
    }
}
