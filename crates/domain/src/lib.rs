//! # pipeline-telemetry-domain
//!
//! Telemetry data model, merge semantics, and date-range generation.
//!
//! This crate contains the core domain model with no infrastructure dependencies:
//!
//! - **Types** - `TelemetryType`, `TrafficLight`
//! - **Counters** - `TelemetryData`, `SubProcessKey`
//! - **Model** - `TelemetryModel` and its aggregation merge
//! - **Windows** - `DateTimeRange`, `DateRanges`, `DateRangeRegistry`
//! - **Streams** - `TelemetrySelector`, `TelemetryQuery`
//! - **Registry** - `ProcessType`, `ProcessTypeRegistry`
//! - **Persistence shape** - `TelemetryRecord`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// Re-export shared types for convenience
pub use pipeline_telemetry_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod data;
pub mod date_ranges;
pub mod errors;
pub mod model;
pub mod process_type;
pub mod record;
pub mod selector;
pub mod sub_process;
pub mod telemetry_type;

pub use data::{CounterMap, TelemetryData};
pub use date_ranges::{
    DateRangeRegistry, DateRanges, DateTimeRange, Granularity, daily_range_for_single_date,
    daily_range_yesterday, daily_range_yesterday_as_of, daily_ranges, daily_ranges_till_yesterday,
    daily_ranges_till_yesterday_as_of, midnight, monthly_range_for_single_date, monthly_ranges,
    today, weekly_range_for_single_date, weekly_ranges,
};
pub use errors::TelemetryError;
pub use model::{
    AggregationStats, IO_TIME_COUNTER, RUN_TIME_COUNTER, SubProcessMap, TelemetryModel,
};
pub use process_type::{
    CREATE_DATA_FROM_API, CREATE_DATA_FROM_FILE, CREATE_DATA_FROM_URL, ProcessType,
    ProcessTypeRegistry, UPLOAD_DATA,
};
pub use record::{DATE_TIME_FORMAT, TelemetryRecord, format_date_time, parse_date_time};
pub use selector::{TelemetryQuery, TelemetrySelector};
pub use sub_process::{AGGREGATION_STATS_KEY, SubProcessKey};
pub use telemetry_type::{TelemetryType, TrafficLight};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
