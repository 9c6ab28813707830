//! Time-windowed rollups of stored telemetry.
//!
//! An [`Aggregator`] reads every record of its source type for one stream and
//! one window, folds them into a single model of its target type, stamps the
//! result to the window start and replaces whatever aggregation was stored
//! for that window before.

use pipeline_telemetry_domain::{
    DateRangeRegistry, DateTimeRange, TelemetryModel, TelemetryQuery, TelemetrySelector,
    TelemetryType, today,
};
use pipeline_telemetry_ports::{LogFields, LoggerPort, TelemetryStoragePort};
use pipeline_telemetry_shared::{ErrorEnvelope, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Source and target telemetry types of one aggregation flavor.
pub trait AggregationKind {
    /// Short name used in log events.
    const NAME: &'static str;
    /// Type of the records that are folded.
    const FROM_TYPE: TelemetryType;
    /// Type of the stored result.
    const TO_TYPE: TelemetryType;
}

/// `SINGLE` runs rolled up per calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct Daily;

impl AggregationKind for Daily {
    const NAME: &'static str = "daily";
    const FROM_TYPE: TelemetryType = TelemetryType::Single;
    const TO_TYPE: TelemetryType = TelemetryType::DailyAggr;
}

/// `PARTIAL` records rolled up into one `SINGLE` record per day.
///
/// Replace-on-write keys on the target type, so storing the rollup deletes
/// every `SINGLE` row of the stream started that day, including runs that
/// were recorded as `SINGLE` directly. Keep a stream either partial or single.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialToSingle;

impl AggregationKind for PartialToSingle {
    const NAME: &'static str = "partial_to_single";
    const FROM_TYPE: TelemetryType = TelemetryType::Partial;
    const TO_TYPE: TelemetryType = TelemetryType::Single;
}

/// `SINGLE` runs rolled up per Monday-based week.
#[derive(Debug, Clone, Copy, Default)]
pub struct Weekly;

impl AggregationKind for Weekly {
    const NAME: &'static str = "weekly";
    const FROM_TYPE: TelemetryType = TelemetryType::Single;
    const TO_TYPE: TelemetryType = TelemetryType::WeeklyAggr;
}

/// `SINGLE` runs rolled up per calendar month.
#[derive(Debug, Clone, Copy, Default)]
pub struct Monthly;

impl AggregationKind for Monthly {
    const NAME: &'static str = "monthly";
    const FROM_TYPE: TelemetryType = TelemetryType::Single;
    const TO_TYPE: TelemetryType = TelemetryType::MonthlyAggr;
}

/// SINGLE → `DAILY_AGGR`.
pub type DailyAggregator = Aggregator<Daily>;
/// PARTIAL → SINGLE.
pub type PartialToSingleAggregator = Aggregator<PartialToSingle>;
/// SINGLE → `WEEKLY_AGGR`.
pub type WeeklyAggregator = Aggregator<Weekly>;
/// SINGLE → `MONTHLY_AGGR`.
pub type MonthlyAggregator = Aggregator<Monthly>;

/// Outcome of one stored window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    /// The aggregated window.
    pub range: DateTimeRange,
    /// Number of source records folded into the result.
    pub source_records: i64,
    /// Number of previously stored aggregations that were replaced.
    pub replaced: usize,
}

/// Outcome of one `aggregate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSummary {
    /// Target telemetry type.
    pub telemetry_type: TelemetryType,
    /// Aggregated stream.
    pub selector: TelemetrySelector,
    /// One entry per processed window, in chronological order.
    pub windows: Vec<WindowSummary>,
}

impl AggregationSummary {
    /// Source records folded across all windows.
    #[must_use]
    pub fn total_source_records(&self) -> i64 {
        self.windows.iter().map(|window| window.source_records).sum()
    }
}

/// Rolls stored telemetry of `K::FROM_TYPE` into `K::TO_TYPE` windows.
pub struct Aggregator<K: AggregationKind> {
    selector: TelemetrySelector,
    storage: Arc<dyn TelemetryStoragePort>,
    registry: DateRangeRegistry,
    logger: Option<Arc<dyn LoggerPort>>,
    target: TelemetryModel,
    kind: PhantomData<K>,
}

impl<K: AggregationKind> Aggregator<K> {
    /// Aggregator for `selector` using the default date-range registry.
    #[must_use]
    pub fn new(selector: TelemetrySelector, storage: Arc<dyn TelemetryStoragePort>) -> Self {
        let target = TelemetryModel::new(K::TO_TYPE, &selector);
        Self {
            selector,
            storage,
            registry: DateRangeRegistry::default(),
            logger: None,
            target,
            kind: PhantomData,
        }
    }

    /// Replace the date-range registry.
    #[must_use]
    pub fn with_registry(mut self, registry: DateRangeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Attach a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Template every window result starts from: identity fields only.
    #[must_use]
    pub const fn target_telemetry(&self) -> &TelemetryModel {
        &self.target
    }

    /// The aggregated stream.
    #[must_use]
    pub const fn selector(&self) -> &TelemetrySelector {
        &self.selector
    }

    /// Aggregate every `K::TO_TYPE` window from `start` through `end`.
    ///
    /// Fails before any storage call when `K::TO_TYPE` has no registered
    /// granularity. Windows already stored stay stored if a later window fails.
    pub fn aggregate(&self, start: NaiveDate, end: NaiveDate) -> Result<AggregationSummary> {
        let ranges = self
            .registry
            .ranges(K::TO_TYPE, start, end)
            .map_err(ErrorEnvelope::from)?;

        let logger = self.logger.as_ref().map(|logger| logger.child(self.log_fields()));
        if let Some(logger) = logger.as_ref() {
            logger.info(
                "aggregate.start",
                "Aggregation started",
                Some(span_fields(start, end)),
            );
        }

        let mut summary = AggregationSummary {
            telemetry_type: K::TO_TYPE,
            selector: self.selector.clone(),
            windows: Vec::new(),
        };

        for range in ranges {
            match self.aggregate_window(range) {
                Ok(window) => {
                    if let Some(logger) = logger.as_ref() {
                        logger.debug(
                            "aggregate.range.done",
                            "Aggregation window stored",
                            Some(window_fields(&window)),
                        );
                    }
                    summary.windows.push(window);
                },
                Err(error) => {
                    if let Some(logger) = logger.as_ref() {
                        logger.error_envelope(
                            "aggregate.failed",
                            "Aggregation failed",
                            Some(range_fields(range)),
                            &error,
                        );
                    }
                    return Err(error);
                },
            }
        }

        if let Some(logger) = logger.as_ref() {
            let mut fields = span_fields(start, end);
            fields.insert("windows".into(), Value::from(summary.windows.len()));
            fields.insert(
                "sourceRecords".into(),
                Value::from(summary.total_source_records()),
            );
            logger.info("aggregate.completed", "Aggregation completed", Some(fields));
        }

        Ok(summary)
    }

    /// Fold every source record in `range` into a fresh copy of the target.
    ///
    /// Nothing is stored; the result is stamped to `range.from_date`.
    pub fn run_aggregation(&self, range: DateTimeRange) -> Result<TelemetryModel> {
        let query = self.telemetry_list_query(range);
        let mut aggregated = self.target.template_copy();
        for telemetry in self.storage.telemetry_list(&query)? {
            aggregated += &telemetry?;
        }
        aggregated.start_date_time = range.from_date;
        Ok(aggregated)
    }

    /// Query selecting the source records of `range`.
    #[must_use]
    pub fn telemetry_list_query(&self, range: DateTimeRange) -> TelemetryQuery {
        TelemetryQuery::for_range(K::FROM_TYPE, &self.selector, range)
    }

    fn aggregate_window(&self, range: DateTimeRange) -> Result<WindowSummary> {
        let aggregated = self.run_aggregation(range)?;
        let replaced = self
            .storage
            .remove_existing_aggregation(&aggregated, &self.registry)?;
        self.storage.store_telemetry(&aggregated)?;

        Ok(WindowSummary {
            range,
            source_records: aggregated
                .aggregation_stats()
                .map_or(0, |stats| stats.records()),
            replaced,
        })
    }

    fn log_fields(&self) -> LogFields {
        let mut fields = LogFields::new();
        fields.insert("aggregation".into(), Value::from(K::NAME));
        fields.insert("fromType".into(), Value::from(K::FROM_TYPE.as_str()));
        fields.insert("toType".into(), Value::from(K::TO_TYPE.as_str()));
        fields.insert("selector".into(), Value::from(self.selector.to_string()));
        fields
    }
}

impl Aggregator<Daily> {
    /// Aggregate with `start = today` and `end = yesterday`.
    ///
    /// The start lies after the end, so no window is produced and nothing is
    /// stored. Use [`Aggregator::aggregate_yesterday_window`] to roll up
    /// yesterday.
    pub fn aggregate_yesterday(&self) -> Result<AggregationSummary> {
        self.aggregate_yesterday_as_of(today())
    }

    /// [`Aggregator::aggregate_yesterday`] relative to an explicit `today`.
    pub fn aggregate_yesterday_as_of(&self, today: NaiveDate) -> Result<AggregationSummary> {
        self.aggregate(today, yesterday(today))
    }

    /// Aggregate the single daily window covering yesterday.
    pub fn aggregate_yesterday_window(&self) -> Result<AggregationSummary> {
        self.aggregate_yesterday_window_as_of(today())
    }

    /// [`Aggregator::aggregate_yesterday_window`] relative to an explicit `today`.
    pub fn aggregate_yesterday_window_as_of(
        &self,
        today: NaiveDate,
    ) -> Result<AggregationSummary> {
        self.aggregate(yesterday(today), today)
    }
}

fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

fn span_fields(start: NaiveDate, end: NaiveDate) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("start".into(), Value::String(start.to_string()));
    fields.insert("end".into(), Value::String(end.to_string()));
    fields
}

fn range_fields(range: DateTimeRange) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("from".into(), Value::String(range.from_date.to_string()));
    fields.insert("to".into(), Value::String(range.to_date.to_string()));
    fields
}

fn window_fields(window: &WindowSummary) -> LogFields {
    let mut fields = range_fields(window.range);
    fields.insert("sourceRecords".into(), Value::from(window.source_records));
    fields.insert("replaced".into(), Value::from(window.replaced));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_telemetry_domain::{TelemetryRecord, daily_range_for_single_date};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingStorage {
        rows: Mutex<Vec<TelemetryRecord>>,
        calls: Mutex<usize>,
    }

    impl CountingStorage {
        fn bump(&self) {
            if let Ok(mut calls) = self.calls.lock() {
                *calls += 1;
            }
        }

        fn calls(&self) -> usize {
            self.calls.lock().map_or(0, |calls| *calls)
        }
    }

    impl TelemetryStoragePort for CountingStorage {
        fn store_telemetry(&self, telemetry: &TelemetryModel) -> Result<()> {
            self.bump();
            let record = TelemetryRecord::from_model(telemetry)?;
            if let Ok(mut rows) = self.rows.lock() {
                rows.push(record);
            }
            Ok(())
        }

        fn select_records(&self, query: &TelemetryQuery) -> Result<Vec<TelemetryRecord>> {
            self.bump();
            Ok(self.rows.lock().map_or_else(
                |_| Vec::new(),
                |rows| rows.iter().filter(|row| row.matches(query)).cloned().collect(),
            ))
        }

        fn delete_records(&self, query: &TelemetryQuery) -> Result<usize> {
            self.bump();
            let mut rows = self.rows.lock().map_err(|_| {
                ErrorEnvelope::invariant(
                    pipeline_telemetry_shared::ErrorCode::internal(),
                    "poisoned",
                )
            })?;
            let before = rows.len();
            rows.retain(|row| !row.matches(query));
            Ok(before - rows.len())
        }
    }

    fn selector() -> TelemetrySelector {
        TelemetrySelector::new("WEATHER", "DAILY", "load", "create_data_from_url")
    }

    #[test]
    fn target_template_copies_selector_and_type() {
        let storage = Arc::new(CountingStorage::default());
        let aggregator = WeeklyAggregator::new(selector(), storage);
        let target = aggregator.target_telemetry();
        assert_eq!(target.telemetry_type, TelemetryType::WeeklyAggr);
        assert_eq!(target.selector(), selector());
        assert!(target.telemetry.is_empty());
    }

    #[test]
    fn unregistered_target_fails_before_storage_io() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let storage = Arc::new(CountingStorage::default());
        let aggregator =
            DailyAggregator::new(selector(), storage.clone()).with_registry(DateRangeRegistry::empty());
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).ok_or("bad date")?;

        let Err(error) = aggregator.aggregate(day, day) else {
            return Err("expected lookup failure".into());
        };
        assert_eq!(
            error.code.to_string(),
            "lookup:requested_date_time_range_method_not_found"
        );
        assert_eq!(storage.calls(), 0);
        Ok(())
    }

    #[test]
    fn empty_window_still_stores_a_stamped_aggregate() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let storage = Arc::new(CountingStorage::default());
        let aggregator = DailyAggregator::new(selector(), storage.clone());
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).ok_or("bad date")?;
        let next = day.succ_opt().ok_or("bad date")?;

        let summary = aggregator.aggregate(day, next)?;
        assert_eq!(summary.windows.len(), 1);
        assert_eq!(summary.total_source_records(), 0);

        let query = TelemetryQuery::for_range(
            TelemetryType::DailyAggr,
            &selector(),
            daily_range_for_single_date(day),
        );
        let stored = storage.select_records(&query)?;
        assert_eq!(stored.len(), 1);
        assert_eq!(
            stored.first().map(|row| row.start_date_time),
            Some(daily_range_for_single_date(day).from_date)
        );
        Ok(())
    }

    #[test]
    fn literal_yesterday_is_a_no_op_and_window_variant_is_not(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let storage = Arc::new(CountingStorage::default());
        let aggregator = DailyAggregator::new(selector(), storage);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("bad date")?;

        assert!(aggregator.aggregate_yesterday_as_of(today)?.windows.is_empty());

        let summary = aggregator.aggregate_yesterday_window_as_of(today)?;
        let window = summary.windows.first().ok_or("missing window")?;
        let feb_29 = NaiveDate::from_ymd_opt(2024, 2, 29).ok_or("bad date")?;
        assert_eq!(window.range, daily_range_for_single_date(feb_29));
        Ok(())
    }
}
