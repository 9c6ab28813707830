use super::{SCHEMA_VERSION, lock_poisoned, not_initialized, storage_error};
use pipeline_telemetry_domain::{
    TelemetryModel, TelemetryQuery, TelemetryRecord, format_date_time, parse_date_time,
};
use pipeline_telemetry_ports::TelemetryStoragePort;
use pipeline_telemetry_shared::{ErrorEnvelope, Result};
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const BACKEND: &str = "sqlite";

/// Telemetry store backed by one `SQLite` database.
///
/// Start times are stored as fixed-width text, so the range predicates in
/// `select_records` compare lexicographically in chronological order.
#[derive(Debug)]
pub struct SqliteTelemetryStorage {
    path: Option<PathBuf>,
    connection: Mutex<Option<Connection>>,
}

impl SqliteTelemetryStorage {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|error| sqlite_error(&format!("sqlite mkdir failed: {error}")))?;
        }

        let conn = Connection::open(&path)
            .map_err(|error| sqlite_error(&format!("sqlite open failed: {error}")))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|error| sqlite_error(&format!("sqlite pragma failed: {error}")))?;
        prepare_connection(&conn)?;

        Ok(Self {
            path: Some(path),
            connection: Mutex::new(Some(conn)),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|error| sqlite_error(&format!("sqlite open failed: {error}")))?;
        prepare_connection(&conn)?;

        Ok(Self {
            path: None,
            connection: Mutex::new(Some(conn)),
        })
    }

    /// Database file, or `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection. Later operations fail with `storage_not_initialized`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.connection.lock().map_err(|_| lock_poisoned(BACKEND))?;
        if let Some(conn) = guard.take() {
            conn.close()
                .map_err(|(_, error)| sqlite_error(&format!("sqlite close failed: {error}")))?;
        }
        Ok(())
    }

    /// True until [`SqliteTelemetryStorage::close`] is called.
    pub fn is_open(&self) -> bool {
        self.connection.lock().is_ok_and(|conn| conn.is_some())
    }

    fn with_connection<T>(&self, op: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.connection.lock().map_err(|_| lock_poisoned(BACKEND))?;
        let conn = guard.as_ref().ok_or_else(|| not_initialized(BACKEND))?;
        op(conn)
    }
}

impl TelemetryStoragePort for SqliteTelemetryStorage {
    fn store_telemetry(&self, telemetry: &TelemetryModel) -> Result<()> {
        let record = TelemetryRecord::from_model(telemetry)?;
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO telemetry (telemetry_type, category, sub_category, source_name, process_type, start_date_time, run_time_in_seconds, io_time_in_seconds, traffic_light, telemetry_data) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.telemetry_type,
                    record.category,
                    record.sub_category,
                    record.source_name,
                    record.process_type,
                    format_date_time(record.start_date_time),
                    record.run_time_in_seconds,
                    record.io_time_in_seconds,
                    record.traffic_light,
                    record.telemetry_data,
                ],
            )
            .map_err(|error| sqlite_error(&format!("sqlite insert failed: {error}")))?;
            Ok(())
        })
    }

    fn select_records(&self, query: &TelemetryQuery) -> Result<Vec<TelemetryRecord>> {
        let rows = self.with_connection(|conn| {
            let mut statement = conn
                .prepare(
                    "SELECT telemetry_type, category, sub_category, source_name, process_type, start_date_time, run_time_in_seconds, io_time_in_seconds, traffic_light, telemetry_data FROM telemetry WHERE telemetry_type = ?1 AND category = ?2 AND sub_category = ?3 AND source_name = ?4 AND process_type = ?5 AND start_date_time >= ?6 AND start_date_time < ?7 ORDER BY start_date_time ASC, id ASC",
                )
                .map_err(|error| sqlite_error(&format!("sqlite select prepare failed: {error}")))?;

            let mapped = statement
                .query_map(query_params(query), |row| {
                    Ok(RawRow {
                        telemetry_type: row.get(0)?,
                        category: row.get(1)?,
                        sub_category: row.get(2)?,
                        source_name: row.get(3)?,
                        process_type: row.get(4)?,
                        start_date_time: row.get(5)?,
                        run_time_in_seconds: row.get(6)?,
                        io_time_in_seconds: row.get(7)?,
                        traffic_light: row.get(8)?,
                        telemetry_data: row.get(9)?,
                    })
                })
                .map_err(|error| sqlite_error(&format!("sqlite select failed: {error}")))?;

            mapped
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|error| sqlite_error(&format!("sqlite row read failed: {error}")))
        })?;

        rows.into_iter().map(RawRow::into_record).collect()
    }

    fn delete_records(&self, query: &TelemetryQuery) -> Result<usize> {
        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM telemetry WHERE telemetry_type = ?1 AND category = ?2 AND sub_category = ?3 AND source_name = ?4 AND process_type = ?5 AND start_date_time >= ?6 AND start_date_time < ?7",
                query_params(query),
            )
            .map_err(|error| sqlite_error(&format!("sqlite delete failed: {error}")))
        })
    }
}

struct RawRow {
    telemetry_type: String,
    category: String,
    sub_category: String,
    source_name: String,
    process_type: String,
    start_date_time: String,
    run_time_in_seconds: Option<f64>,
    io_time_in_seconds: f64,
    traffic_light: String,
    telemetry_data: String,
}

impl RawRow {
    fn into_record(self) -> Result<TelemetryRecord> {
        Ok(TelemetryRecord {
            telemetry_type: self.telemetry_type,
            category: self.category,
            sub_category: self.sub_category,
            source_name: self.source_name,
            process_type: self.process_type,
            start_date_time: parse_date_time(&self.start_date_time)?,
            run_time_in_seconds: self.run_time_in_seconds,
            io_time_in_seconds: self.io_time_in_seconds,
            traffic_light: self.traffic_light,
            telemetry_data: self.telemetry_data,
        })
    }
}

fn query_params(query: &TelemetryQuery) -> [String; 7] {
    [
        query.telemetry_type.as_str().to_string(),
        query.selector.category().to_string(),
        query.selector.sub_category().to_string(),
        query.selector.source_name().to_string(),
        query.selector.process_type().to_string(),
        format_date_time(query.range.from_date),
        format_date_time(query.range.to_date),
    ]
}

fn prepare_connection(conn: &Connection) -> Result<()> {
    init_sqlite_schema(conn)?;

    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|error| sqlite_error(&format!("sqlite version failed: {error}")))?;

    if version == 0 {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))
            .map_err(|error| sqlite_error(&format!("sqlite version set failed: {error}")))?;
        return Ok(());
    }

    if version != SCHEMA_VERSION {
        return Err(sqlite_error(&format!(
            "sqlite schema version {version} is not supported (expected {SCHEMA_VERSION})"
        ))
        .with_metadata("schemaVersion", version.to_string()));
    }

    Ok(())
}

fn init_sqlite_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS telemetry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telemetry_type TEXT NOT NULL,
            category TEXT NOT NULL,
            sub_category TEXT NOT NULL,
            source_name TEXT NOT NULL,
            process_type TEXT NOT NULL,
            start_date_time TEXT NOT NULL,
            run_time_in_seconds REAL,
            io_time_in_seconds REAL NOT NULL DEFAULT 0,
            traffic_light TEXT NOT NULL,
            telemetry_data TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS telemetry_stream_start
            ON telemetry (telemetry_type, category, sub_category, source_name, process_type, start_date_time);",
    )
    .map_err(|error| sqlite_error(&format!("sqlite schema failed: {error}")))?;
    Ok(())
}

fn sqlite_error(message: &str) -> ErrorEnvelope {
    storage_error(BACKEND, message)
}
