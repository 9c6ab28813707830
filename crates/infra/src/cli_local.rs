//! Local CLI orchestration helpers.

use crate::{InfraResult, build_logger, build_storage};
use chrono::NaiveDate;
use pipeline_telemetry_app::{
    AggregationKind, AggregationSummary, Aggregator, DailyAggregator, MonthlyAggregator,
    PartialToSingleAggregator, WeeklyAggregator,
};
use pipeline_telemetry_config::ValidatedTelemetryConfig;
use pipeline_telemetry_domain::{
    DateTimeRange, TelemetryModel, TelemetryQuery, TelemetrySelector, TelemetryType,
};
use pipeline_telemetry_ports::{LoggerPort, TelemetryStoragePort};
use pipeline_telemetry_shared::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Aggregation flavors exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationFlavor {
    /// SINGLE → `DAILY_AGGR`.
    Daily,
    /// SINGLE → `WEEKLY_AGGR`.
    Weekly,
    /// SINGLE → `MONTHLY_AGGR`.
    Monthly,
    /// PARTIAL → SINGLE.
    PartialToSingle,
}

impl AggregationFlavor {
    /// Kebab-case name used by the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::PartialToSingle => "partial-to-single",
        }
    }
}

impl fmt::Display for AggregationFlavor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One `aggregate` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    /// Which rollup to run.
    pub flavor: AggregationFlavor,
    /// Stream to aggregate.
    pub selector: TelemetrySelector,
    /// First day of the span.
    pub from: NaiveDate,
    /// End of the span; the last window must end on or before it.
    pub to: NaiveDate,
}

/// How `aggregate yesterday` resolves its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YesterdayMode {
    /// The single daily window covering yesterday.
    #[default]
    Window,
    /// `start = today`, `end = yesterday`; produces no window.
    Literal,
}

/// Rows listed by `records list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordsRequest {
    /// Telemetry type to list.
    pub telemetry_type: TelemetryType,
    /// Stream to list.
    pub selector: TelemetrySelector,
    /// First day, inclusive.
    pub from: NaiveDate,
    /// Last day, exclusive.
    pub to: NaiveDate,
}

/// Run an aggregation against the storage selected by `config`.
pub fn run_aggregate_local(
    config: &ValidatedTelemetryConfig,
    request: &AggregateRequest,
) -> InfraResult<AggregationSummary> {
    let storage = build_storage(config)?;
    run_aggregate(storage, Some(build_logger(config)), request)
}

/// Run an aggregation against an explicit storage port.
pub fn run_aggregate(
    storage: Arc<dyn TelemetryStoragePort>,
    logger: Option<Arc<dyn LoggerPort>>,
    request: &AggregateRequest,
) -> InfraResult<AggregationSummary> {
    let selector = request.selector.clone();
    match request.flavor {
        AggregationFlavor::Daily => {
            aggregate_span(DailyAggregator::new(selector, storage), logger, request)
        },
        AggregationFlavor::Weekly => {
            aggregate_span(WeeklyAggregator::new(selector, storage), logger, request)
        },
        AggregationFlavor::Monthly => {
            aggregate_span(MonthlyAggregator::new(selector, storage), logger, request)
        },
        AggregationFlavor::PartialToSingle => {
            aggregate_span(PartialToSingleAggregator::new(selector, storage), logger, request)
        },
    }
}

/// Run the daily rollup of yesterday against the storage selected by `config`.
pub fn run_aggregate_yesterday_local(
    config: &ValidatedTelemetryConfig,
    selector: TelemetrySelector,
    mode: YesterdayMode,
) -> InfraResult<AggregationSummary> {
    let storage = build_storage(config)?;
    let aggregator = DailyAggregator::new(selector, storage).with_logger(build_logger(config));
    match mode {
        YesterdayMode::Window => aggregator.aggregate_yesterday_window(),
        YesterdayMode::Literal => aggregator.aggregate_yesterday(),
    }
}

/// List stored models against the storage selected by `config`.
pub fn list_records_local(
    config: &ValidatedTelemetryConfig,
    request: &RecordsRequest,
) -> InfraResult<Vec<TelemetryModel>> {
    let storage = build_storage(config)?;
    list_records(storage.as_ref(), request)
}

/// List stored models matching `request`, oldest first.
pub fn list_records(
    storage: &dyn TelemetryStoragePort,
    request: &RecordsRequest,
) -> InfraResult<Vec<TelemetryModel>> {
    let query = TelemetryQuery::for_range(
        request.telemetry_type,
        &request.selector,
        DateTimeRange::from_dates(request.from, request.to),
    );
    let mut models = storage.telemetry_list(&query)?.collect::<Result<Vec<_>>>()?;
    models.sort_by_key(|model| model.start_date_time);
    Ok(models)
}

fn aggregate_span<K: AggregationKind>(
    aggregator: Aggregator<K>,
    logger: Option<Arc<dyn LoggerPort>>,
    request: &AggregateRequest,
) -> InfraResult<AggregationSummary> {
    let aggregator = match logger {
        Some(logger) => aggregator.with_logger(logger),
        None => aggregator,
    };
    aggregator.aggregate(request.from, request.to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_telemetry_adapters::InMemoryTelemetryStorage;
    use pipeline_telemetry_domain::midnight;
    use std::error::Error;

    fn selector() -> TelemetrySelector {
        TelemetrySelector::new("WEATHER", "DAILY", "load", "create_data_from_url")
    }

    #[test]
    fn flavors_dispatch_to_their_target_type() -> std::result::Result<(), Box<dyn Error>> {
        let storage: Arc<dyn TelemetryStoragePort> = Arc::new(InMemoryTelemetryStorage::new());
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
        let to = NaiveDate::from_ymd_opt(2024, 2, 1).ok_or("bad date")?;

        let cases = [
            (AggregationFlavor::Daily, TelemetryType::DailyAggr, 31),
            (AggregationFlavor::Weekly, TelemetryType::WeeklyAggr, 4),
            (AggregationFlavor::Monthly, TelemetryType::MonthlyAggr, 1),
            (AggregationFlavor::PartialToSingle, TelemetryType::Single, 31),
        ];
        for (flavor, expected_type, windows) in cases {
            let request = AggregateRequest {
                flavor,
                selector: selector(),
                from,
                to,
            };
            let summary = run_aggregate(storage.clone(), None, &request)?;
            assert_eq!(summary.telemetry_type, expected_type, "{flavor}");
            assert_eq!(summary.windows.len(), windows, "{flavor}");
        }
        Ok(())
    }

    #[test]
    fn list_records_sorts_by_start() -> std::result::Result<(), Box<dyn Error>> {
        let storage = InMemoryTelemetryStorage::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).ok_or("bad date")?;
        let later = midnight(day) + chrono::TimeDelta::hours(5);
        let earlier = midnight(day) + chrono::TimeDelta::hours(1);
        for start in [later, earlier] {
            storage.store_telemetry(&TelemetryModel::started_at(
                TelemetryType::Single,
                &selector(),
                start,
            ))?;
        }

        let models = list_records(
            &storage,
            &RecordsRequest {
                telemetry_type: TelemetryType::Single,
                selector: selector(),
                from: day,
                to: day.succ_opt().ok_or("bad date")?,
            },
        )?;
        let starts: Vec<_> = models.iter().map(|model| model.start_date_time).collect();
        assert_eq!(starts, vec![earlier, later]);
        Ok(())
    }
}
