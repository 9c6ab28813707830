//! # pipeline-telemetry-app
//!
//! Application use cases: recording pipeline runs and rolling stored runs up
//! into daily, weekly and monthly aggregates.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod aggregator;
pub mod recorder;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use aggregator::{
    AggregationKind, AggregationSummary, Aggregator, Daily, DailyAggregator, Monthly,
    MonthlyAggregator, PartialToSingle, PartialToSingleAggregator, Weekly, WeeklyAggregator,
    WindowSummary,
};
pub use recorder::Telemetry;

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_telemetry_domain::domain_crate_version;
    use pipeline_telemetry_ports::ports_crate_version;
    use pipeline_telemetry_shared::shared_crate_version;

    #[test]
    fn app_crate_compiles() {
        let version = app_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn app_can_use_ports_domain_shared() {
        let ports_version = ports_crate_version();
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!ports_version.is_empty());
        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}
