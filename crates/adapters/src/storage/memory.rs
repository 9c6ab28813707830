use super::{lock_poisoned, not_initialized};
use pipeline_telemetry_domain::{TelemetryModel, TelemetryQuery, TelemetryRecord};
use pipeline_telemetry_ports::TelemetryStoragePort;
use pipeline_telemetry_shared::Result;
use std::sync::Mutex;

const BACKEND: &str = "memory";

/// In-process telemetry store. Rows keep insertion order.
#[derive(Debug)]
pub struct InMemoryTelemetryStorage {
    rows: Mutex<Option<Vec<TelemetryRecord>>>,
}

impl Default for InMemoryTelemetryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTelemetryStorage {
    /// Open an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: Mutex::new(Some(Vec::new())),
        }
    }

    /// Open a store pre-filled with `records`.
    #[must_use]
    pub const fn with_records(records: Vec<TelemetryRecord>) -> Self {
        Self {
            rows: Mutex::new(Some(records)),
        }
    }

    /// Drop all rows and refuse further operations.
    pub fn close(&self) -> Result<()> {
        let mut rows = self.rows.lock().map_err(|_| lock_poisoned(BACKEND))?;
        *rows = None;
        Ok(())
    }

    /// True until [`InMemoryTelemetryStorage::close`] is called.
    pub fn is_open(&self) -> bool {
        self.rows.lock().is_ok_and(|rows| rows.is_some())
    }

    /// Snapshot of every stored row.
    pub fn records(&self) -> Result<Vec<TelemetryRecord>> {
        self.with_rows(|rows| Ok(rows.clone()))
    }

    fn with_rows<T>(&self, op: impl FnOnce(&mut Vec<TelemetryRecord>) -> Result<T>) -> Result<T> {
        let mut guard = self.rows.lock().map_err(|_| lock_poisoned(BACKEND))?;
        let rows = guard.as_mut().ok_or_else(|| not_initialized(BACKEND))?;
        op(rows)
    }
}

impl TelemetryStoragePort for InMemoryTelemetryStorage {
    fn store_telemetry(&self, telemetry: &TelemetryModel) -> Result<()> {
        let record = TelemetryRecord::from_model(telemetry)?;
        self.with_rows(|rows| {
            rows.push(record);
            Ok(())
        })
    }

    fn select_records(&self, query: &TelemetryQuery) -> Result<Vec<TelemetryRecord>> {
        self.with_rows(|rows| {
            Ok(rows
                .iter()
                .filter(|row| row.matches(query))
                .cloned()
                .collect())
        })
    }

    fn delete_records(&self, query: &TelemetryQuery) -> Result<usize> {
        self.with_rows(|rows| {
            let before = rows.len();
            rows.retain(|row| !row.matches(query));
            Ok(before - rows.len())
        })
    }
}
