//! Closed enumerations for telemetry granularity and health.

use crate::errors::TelemetryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity/kind of a telemetry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TelemetryType {
    /// Part of a pipeline run.
    Partial,
    /// One complete pipeline run.
    Single,
    /// Rollup of one calendar day.
    DailyAggr,
    /// Rollup of one Monday-based week.
    WeeklyAggr,
    /// Rollup of one calendar month.
    MonthlyAggr,
    /// Rollup of one quarter.
    QuarterlyAggr,
}

impl TelemetryType {
    /// Every telemetry type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Partial,
        Self::Single,
        Self::DailyAggr,
        Self::WeeklyAggr,
        Self::MonthlyAggr,
        Self::QuarterlyAggr,
    ];

    /// Parse the persisted representation.
    pub fn parse(input: &str) -> Result<Self, TelemetryError> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == input)
            .ok_or_else(|| TelemetryError::InvalidTelemetryType {
                value: input.to_string(),
            })
    }

    /// Persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Partial => "PARTIAL",
            Self::Single => "SINGLE",
            Self::DailyAggr => "DAILY_AGGR",
            Self::WeeklyAggr => "WEEKLY_AGGR",
            Self::MonthlyAggr => "MONTHLY_AGGR",
            Self::QuarterlyAggr => "QUARTERLY_AGGR",
        }
    }

    /// True for the time-bucketed rollup types.
    #[must_use]
    pub const fn is_aggregation(self) -> bool {
        matches!(
            self,
            Self::DailyAggr | Self::WeeklyAggr | Self::MonthlyAggr | Self::QuarterlyAggr
        )
    }
}

impl fmt::Display for TelemetryType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for TelemetryType {
    type Err = TelemetryError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

/// Coarse health signal of one run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrafficLight {
    /// Healthy.
    #[default]
    Green,
    /// Degraded (validation errors, partial failures).
    Orange,
    /// Failed.
    Red,
}

impl TrafficLight {
    /// Parse the persisted representation.
    pub fn parse(input: &str) -> Result<Self, TelemetryError> {
        match input {
            "GREEN" => Ok(Self::Green),
            "ORANGE" => Ok(Self::Orange),
            "RED" => Ok(Self::Red),
            other => Err(TelemetryError::InvalidTrafficLight {
                value: other.to_string(),
            }),
        }
    }

    /// Persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Orange => "ORANGE",
            Self::Red => "RED",
        }
    }

    /// The more severe of two lights.
    #[must_use]
    pub fn escalate(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for TrafficLight {
    type Err = TelemetryError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_type_parse_matches_as_str() -> Result<(), TelemetryError> {
        for telemetry_type in TelemetryType::ALL {
            assert_eq!(TelemetryType::parse(telemetry_type.as_str())?, telemetry_type);
        }
        Ok(())
    }

    #[test]
    fn invalid_telemetry_type_is_rejected() {
        let result = TelemetryType::parse("HOURLY_AGGR");
        assert_eq!(
            result,
            Err(TelemetryError::InvalidTelemetryType {
                value: "HOURLY_AGGR".to_string()
            })
        );
    }

    #[test]
    fn serde_uses_persisted_names() -> Result<(), serde_json::Error> {
        assert_eq!(
            serde_json::to_string(&TelemetryType::DailyAggr)?,
            "\"DAILY_AGGR\""
        );
        assert_eq!(serde_json::to_string(&TrafficLight::Orange)?, "\"ORANGE\"");
        Ok(())
    }

    #[test]
    fn escalation_never_lowers() {
        assert_eq!(TrafficLight::Red.escalate(TrafficLight::Orange), TrafficLight::Red);
        assert_eq!(
            TrafficLight::Green.escalate(TrafficLight::Orange),
            TrafficLight::Orange
        );
        assert!(TrafficLight::parse("BLUE").is_err());
    }

    #[test]
    fn only_rollups_are_aggregations() {
        assert!(!TelemetryType::Single.is_aggregation());
        assert!(!TelemetryType::Partial.is_aggregation());
        assert!(TelemetryType::QuarterlyAggr.is_aggregation());
    }
}
