//! # pipeline-telemetry-ports
//!
//! Port traits for the pipeline-telemetry hexagonal architecture.
//!
//! This crate defines the interfaces between the domain and infrastructure
//! layers. It depends only on `domain` and `shared`. Every port is
//! synchronous: aggregation runs as a single-threaded batch job and storage
//! calls are ordinary blocking calls.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod logger;
pub mod storage;
pub mod validator;

pub use logger::*;
pub use storage::*;
pub use validator::*;

// Re-export selected domain types used in port signatures, so adapter crates
// can implement ports without naming `pipeline-telemetry-domain` everywhere.
pub use pipeline_telemetry_domain::{
    DateRangeRegistry, SubProcessKey, TelemetryModel, TelemetryQuery, TelemetryRecord,
};
