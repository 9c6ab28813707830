//! Backend-agnostic persisted shape of a telemetry model.
//!
//! One row per model: scalar identity and timing columns plus the nested
//! sub-process map encoded as a JSON blob.

use crate::errors::TelemetryError;
use crate::model::{SubProcessMap, TelemetryModel};
use crate::selector::TelemetryQuery;
use crate::telemetry_type::{TelemetryType, TrafficLight};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Text format used when a backend stores datetimes as strings.
///
/// Fixed width, so lexicographic order equals chronological order.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Persisted telemetry row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Raw telemetry type, validated on load.
    pub telemetry_type: String,
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
    /// Run time, when the run was closed.
    pub run_time_in_seconds: Option<f64>,
    /// Time spent in I/O.
    pub io_time_in_seconds: f64,
    /// Raw traffic light, validated on load.
    pub traffic_light: String,
    /// JSON object: sub-process name to counters.
    pub telemetry_data: String,
}

impl TelemetryRecord {
    /// Flatten a model into its persisted shape.
    pub fn from_model(model: &TelemetryModel) -> Result<Self, TelemetryError> {
        let telemetry_data =
            serde_json::to_string(&model.telemetry).map_err(|error| invalid(&error))?;
        Ok(Self {
            telemetry_type: model.telemetry_type.as_str().to_string(),
            category: model.category.clone(),
            sub_category: model.sub_category.clone(),
            source_name: model.source_name.clone(),
            process_type: model.process_type.clone(),
            start_date_time: model.start_date_time,
            run_time_in_seconds: model.run_time_in_seconds,
            io_time_in_seconds: model.io_time_in_seconds,
            traffic_light: model.traffic_light.as_str().to_string(),
            telemetry_data,
        })
    }

    /// Rebuild the model, validating the closed enumerations and the blob.
    pub fn into_model(self) -> Result<TelemetryModel, TelemetryError> {
        let telemetry_type = TelemetryType::parse(&self.telemetry_type)?;
        let traffic_light = TrafficLight::parse(&self.traffic_light)?;
        let telemetry: SubProcessMap =
            serde_json::from_str(&self.telemetry_data).map_err(|error| invalid(&error))?;
        Ok(TelemetryModel {
            telemetry_type,
            category: self.category,
            sub_category: self.sub_category,
            source_name: self.source_name,
            process_type: self.process_type,
            start_date_time: self.start_date_time,
            run_time_in_seconds: self.run_time_in_seconds,
            io_time_in_seconds: self.io_time_in_seconds,
            traffic_light,
            telemetry,
        })
    }

    /// True when this row satisfies `query`.
    #[must_use]
    pub fn matches(&self, query: &TelemetryQuery) -> bool {
        self.telemetry_type == query.telemetry_type.as_str()
            && self.category == query.selector.category()
            && self.sub_category == query.selector.sub_category()
            && self.source_name == query.selector.source_name()
            && self.process_type == query.selector.process_type()
            && query.range.contains(self.start_date_time)
    }
}

/// Render a datetime in [`DATE_TIME_FORMAT`].
#[must_use]
pub fn format_date_time(value: NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

/// Parse a datetime written by [`format_date_time`].
pub fn parse_date_time(value: &str) -> Result<NaiveDateTime, TelemetryError> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map_err(|error| invalid(&error))
}

fn invalid(error: &dyn std::fmt::Display) -> TelemetryError {
    TelemetryError::InvalidRecord {
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_ranges::daily_range_for_single_date;
    use crate::selector::TelemetrySelector;
    use chrono::NaiveDate;

    fn started() -> Result<NaiveDateTime, String> {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|date| date.and_hms_micro_opt(13, 45, 7, 120_500))
            .ok_or_else(|| "bad date".to_string())
    }

    #[test]
    fn date_time_text_is_fixed_width() -> Result<(), Box<dyn std::error::Error>> {
        let text = format_date_time(started()?);
        assert_eq!(text, "2024-06-01 13:45:07.120500000");
        assert_eq!(parse_date_time(&text)?, started()?);
        Ok(())
    }

    #[test]
    fn corrupt_blob_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let selector = TelemetrySelector::new("a", "b", "c", "d");
        let model = TelemetryModel::started_at(TelemetryType::Single, &selector, started()?);
        let mut record = TelemetryRecord::from_model(&model)?;
        record.telemetry_data = "[1, 2".to_string();
        assert!(matches!(
            record.into_model(),
            Err(TelemetryError::InvalidRecord { .. })
        ));
        Ok(())
    }

    #[test]
    fn matches_uses_half_open_window() -> Result<(), Box<dyn std::error::Error>> {
        let selector = TelemetrySelector::new("a", "b", "c", "d");
        let start = started()?;
        let model = TelemetryModel::started_at(TelemetryType::Single, &selector, start);
        let record = TelemetryRecord::from_model(&model)?;

        let today = daily_range_for_single_date(start.date());
        let query = TelemetryQuery::for_range(TelemetryType::Single, &selector, today);
        assert!(record.matches(&query));

        let next_day = start.date().succ_opt().ok_or("no next day")?;
        let tomorrow = daily_range_for_single_date(next_day);
        let query = TelemetryQuery::for_range(TelemetryType::Single, &selector, tomorrow);
        assert!(!record.matches(&query));

        let query = TelemetryQuery::for_range(TelemetryType::DailyAggr, &selector, today);
        assert!(!record.matches(&query));
        Ok(())
    }
}
