//! Stream selectors and storage range queries.

use crate::date_ranges::DateTimeRange;
use crate::telemetry_type::TelemetryType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one telemetry stream: (category, sub-category, source, process type).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TelemetrySelector {
    category: String,
    sub_category: String,
    source_name: String,
    process_type: String,
}

impl TelemetrySelector {
    /// Build a selector; the fields are free-form.
    pub fn new(
        category: impl Into<String>,
        sub_category: impl Into<String>,
        source_name: impl Into<String>,
        process_type: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            sub_category: sub_category.into(),
            source_name: source_name.into(),
            process_type: process_type.into(),
        }
    }

    /// Category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Sub-category.
    #[must_use]
    pub fn sub_category(&self) -> &str {
        &self.sub_category
    }

    /// Source name.
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Process type name.
    #[must_use]
    pub fn process_type(&self) -> &str {
        &self.process_type
    }
}

impl fmt::Display for TelemetrySelector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{}/{}/{}",
            self.category, self.sub_category, self.source_name, self.process_type
        )
    }
}

/// Range query over stored records: one type, one stream, one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryQuery {
    /// Telemetry type to match.
    pub telemetry_type: TelemetryType,
    /// Stream to match.
    pub selector: TelemetrySelector,
    /// Start-time window; `from` inclusive, `to` exclusive.
    pub range: DateTimeRange,
}

impl TelemetryQuery {
    /// Query for `telemetry_type` records of `selector` started within `range`.
    #[must_use]
    pub fn for_range(
        telemetry_type: TelemetryType,
        selector: &TelemetrySelector,
        range: DateTimeRange,
    ) -> Self {
        Self {
            telemetry_type,
            selector: selector.clone(),
            range,
        }
    }
}
