//! The telemetry envelope and its aggregation merge.

use crate::data::TelemetryData;
use crate::errors::TelemetryError;
use crate::selector::TelemetrySelector;
use crate::sub_process::SubProcessKey;
use crate::telemetry_type::{TelemetryType, TrafficLight};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Stats counter holding the summed rounded io time of merged records.
pub const IO_TIME_COUNTER: &str = "io_time_in_seconds";
/// Stats counter holding the summed rounded run time of merged records.
pub const RUN_TIME_COUNTER: &str = "run_time_in_seconds";

/// Sub-process name to counters.
pub type SubProcessMap = BTreeMap<SubProcessKey, TelemetryData>;

/// One telemetry record: a pipeline run or an aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryModel {
    /// Granularity of this record.
    pub telemetry_type: TelemetryType,
    /// Stream category.
    pub category: String,
    /// Stream sub-category.
    pub sub_category: String,
    /// Stream source name.
    pub source_name: String,
    /// Stream process type.
    pub process_type: String,
    /// Run start, or window start for aggregates.
    pub start_date_time: NaiveDateTime,
    /// Set once when the run is closed.
    pub run_time_in_seconds: Option<f64>,
    /// Time spent in I/O.
    pub io_time_in_seconds: f64,
    /// Coarse health signal.
    pub traffic_light: TrafficLight,
    /// Per-sub-process counters.
    pub telemetry: SubProcessMap,
}

impl TelemetryModel {
    /// Fresh model for `selector`, started now on the local clock.
    #[must_use]
    pub fn new(telemetry_type: TelemetryType, selector: &TelemetrySelector) -> Self {
        Self::started_at(telemetry_type, selector, Local::now().naive_local())
    }

    /// Fresh model for `selector` with an explicit start time.
    #[must_use]
    pub fn started_at(
        telemetry_type: TelemetryType,
        selector: &TelemetrySelector,
        start_date_time: NaiveDateTime,
    ) -> Self {
        Self {
            telemetry_type,
            category: selector.category().to_string(),
            sub_category: selector.sub_category().to_string(),
            source_name: selector.source_name().to_string(),
            process_type: selector.process_type().to_string(),
            start_date_time,
            run_time_in_seconds: None,
            io_time_in_seconds: 0.0,
            traffic_light: TrafficLight::default(),
            telemetry: SubProcessMap::new(),
        }
    }

    /// Copy of the identity fields only: no counters, timings or light.
    #[must_use]
    pub fn template_copy(&self) -> Self {
        Self::new(self.telemetry_type, &self.selector())
    }

    /// Stream this record belongs to.
    #[must_use]
    pub fn selector(&self) -> TelemetrySelector {
        TelemetrySelector::new(
            &self.category,
            &self.sub_category,
            &self.source_name,
            &self.process_type,
        )
    }

    /// True once `run_time_in_seconds` is set.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.run_time_in_seconds.is_some()
    }

    /// Set the run time, closing the model. A second close fails.
    pub fn close(&mut self, run_time_in_seconds: f64) -> Result<(), TelemetryError> {
        if self.is_closed() {
            return Err(TelemetryError::TelemetryObjectAlreadyClosed);
        }
        self.run_time_in_seconds = Some(run_time_in_seconds);
        Ok(())
    }

    /// Counters for `key`, created empty on first access.
    pub fn sub_process_data(&mut self, key: &SubProcessKey) -> &mut TelemetryData {
        self.telemetry.entry(key.clone()).or_default()
    }

    /// Counters for `key` if present.
    #[must_use]
    pub fn get_sub_process_data(&self, key: &str) -> Option<&TelemetryData> {
        self.telemetry.get(key)
    }

    /// Escalate to ORANGE; a RED light stays RED.
    pub fn set_orange_traffic_light(&mut self) {
        self.traffic_light = self.traffic_light.escalate(TrafficLight::Orange);
    }

    /// Escalate to RED.
    pub const fn set_red_traffic_light(&mut self) {
        self.traffic_light = TrafficLight::Red;
    }

    /// Aggregation meta-counters, if this model has absorbed any merges.
    #[must_use]
    pub fn aggregation_stats(&self) -> Option<AggregationStats<'_>> {
        self.telemetry
            .get(crate::sub_process::AGGREGATION_STATS_KEY)
            .map(|data| AggregationStats { data })
    }

    /// Fold `other` into `self` for aggregation.
    ///
    /// Every sub-process of `other` is merged into the same key here. The
    /// reserved stats sub-process records one more aggregated record, one
    /// more tally for `other`'s traffic light, and `other`'s io and run time
    /// rounded half-to-even to whole seconds. Identity fields, timings and the
    /// light of `self` are left as they are.
    pub fn merge(&mut self, other: &Self) {
        for (key, data) in &other.telemetry {
            self.sub_process_data(key).merge(data);
        }

        let stats = self.sub_process_data(&SubProcessKey::aggregation_stats());
        stats.increase_base_count(1);
        stats.increase_custom_count(other.traffic_light.as_str(), 1);
        stats.increase_custom_count(IO_TIME_COUNTER, whole_seconds(other.io_time_in_seconds));
        stats.increase_custom_count(
            RUN_TIME_COUNTER,
            whole_seconds(other.run_time_in_seconds.unwrap_or_default()),
        );
    }

    /// Pure variant of [`TelemetryModel::merge`].
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.merge(other);
        self
    }
}

impl AddAssign<&Self> for TelemetryModel {
    fn add_assign(&mut self, other: &Self) {
        self.merge(other);
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "timings are seconds of a batch run, far below i64::MAX"
)]
fn whole_seconds(seconds: f64) -> i64 {
    seconds.round_ties_even() as i64
}

/// Read view over the reserved aggregation-stats sub-process.
#[derive(Debug, Clone, Copy)]
pub struct AggregationStats<'a> {
    data: &'a TelemetryData,
}

impl AggregationStats<'_> {
    /// Number of records merged.
    #[must_use]
    pub const fn records(&self) -> i64 {
        self.data.base_counter
    }

    /// Number of merged records that carried `light`.
    #[must_use]
    pub fn traffic_light_count(&self, light: TrafficLight) -> i64 {
        self.data.custom_count(light.as_str())
    }

    /// Summed rounded io time.
    #[must_use]
    pub fn io_time_seconds(&self) -> i64 {
        self.data.custom_count(IO_TIME_COUNTER)
    }

    /// Summed rounded run time.
    #[must_use]
    pub fn run_time_seconds(&self) -> i64 {
        self.data.custom_count(RUN_TIME_COUNTER)
    }

    /// The underlying counters.
    #[must_use]
    pub const fn data(&self) -> &TelemetryData {
        self.data
    }
}
