//! Half-open datetime windows and their generators.
//!
//! Every generator yields contiguous, non-overlapping `[from, to)` windows
//! whose boundaries fall on midnight. Inputs are calendar dates, so a
//! time-of-day offset is discarded before any window is built.

use crate::errors::TelemetryError;
use crate::telemetry_type::TelemetryType;
use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Half-open datetime window `[from_date, to_date)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateTimeRange {
    /// Inclusive lower bound.
    pub from_date: NaiveDateTime,
    /// Exclusive upper bound.
    pub to_date: NaiveDateTime,
}

impl DateTimeRange {
    /// Window between two dates, each at midnight.
    #[must_use]
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from_date: midnight(from),
            to_date: midnight(to),
        }
    }

    /// True when `instant` lies within `[from_date, to_date)`.
    #[must_use]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.from_date <= instant && instant < self.to_date
    }
}

impl fmt::Display for DateTimeRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[{}, {})", self.from_date, self.to_date)
    }
}

/// Midnight at the start of `date`.
#[must_use]
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Width of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One calendar day.
    Daily,
    /// Monday to Monday.
    Weekly,
    /// First of month to first of next month.
    Monthly,
}

impl Granularity {
    /// Snap a date back to the start of its window.
    #[must_use]
    pub fn align(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => date
                .checked_sub_days(Days::new(u64::from(
                    date.weekday().num_days_from_monday(),
                )))
                .unwrap_or(date),
            Self::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// Start of the window following the one starting at `window_start`.
    ///
    /// `None` only at the edge of the representable calendar.
    #[must_use]
    pub fn advance(self, window_start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => window_start.checked_add_days(Days::new(1)),
            Self::Weekly => window_start.checked_add_days(Days::new(7)),
            Self::Monthly => window_start.checked_add_months(Months::new(1)),
        }
    }

    /// The single window containing `date`.
    #[must_use]
    pub fn range_for_single_date(self, date: NaiveDate) -> DateTimeRange {
        let from = self.align(date);
        let to = self.advance(from).unwrap_or(from);
        DateTimeRange::from_dates(from, to)
    }

    /// Lazy windows covering `[start, end]`; see [`DateRanges`].
    #[must_use]
    pub fn ranges(self, start: NaiveDate, end: NaiveDate) -> DateRanges {
        DateRanges::new(self, start, end)
    }
}

/// Lazy, restartable sequence of windows.
///
/// The first window starts at `start` snapped to its granularity; windows are
/// yielded while their exclusive end stays on or before `end`. A start after
/// the end yields nothing. Cloning restarts from the current position, and
/// rebuilding from the same inputs always yields the same sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRanges {
    granularity: Granularity,
    next_from: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRanges {
    /// Build the sequence for `[start, end]`.
    #[must_use]
    pub fn new(granularity: Granularity, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            granularity,
            next_from: Some(granularity.align(start)),
            end,
        }
    }

    /// Window width of this sequence.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl Iterator for DateRanges {
    type Item = DateTimeRange;

    fn next(&mut self) -> Option<Self::Item> {
        let from = self.next_from?;
        let to = self.granularity.advance(from)?;
        if to > self.end {
            self.next_from = None;
            return None;
        }
        self.next_from = Some(to);
        Some(DateTimeRange::from_dates(from, to))
    }
}

impl std::iter::FusedIterator for DateRanges {}

/// One window per calendar day from `start` up to midnight of `end`.
#[must_use]
pub fn daily_ranges(start: NaiveDate, end: NaiveDate) -> DateRanges {
    Granularity::Daily.ranges(start, end)
}

/// Monday-based weeks fully contained in `[align(start), end]`.
#[must_use]
pub fn weekly_ranges(start: NaiveDate, end: NaiveDate) -> DateRanges {
    Granularity::Weekly.ranges(start, end)
}

/// Calendar months fully contained in `[align(start), end]`.
#[must_use]
pub fn monthly_ranges(start: NaiveDate, end: NaiveDate) -> DateRanges {
    Granularity::Monthly.ranges(start, end)
}

/// The day window containing `date`.
#[must_use]
pub fn daily_range_for_single_date(date: NaiveDate) -> DateTimeRange {
    Granularity::Daily.range_for_single_date(date)
}

/// The Monday-based week window containing `date`.
#[must_use]
pub fn weekly_range_for_single_date(date: NaiveDate) -> DateTimeRange {
    Granularity::Weekly.range_for_single_date(date)
}

/// The calendar-month window containing `date`.
#[must_use]
pub fn monthly_range_for_single_date(date: NaiveDate) -> DateTimeRange {
    Granularity::Monthly.range_for_single_date(date)
}

/// Today's date on the local clock.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Daily windows from `start` up to (not including) `today`.
#[must_use]
pub fn daily_ranges_till_yesterday_as_of(start: NaiveDate, today: NaiveDate) -> DateRanges {
    daily_ranges(start, today)
}

/// Daily windows from `start` up to the local today.
#[must_use]
pub fn daily_ranges_till_yesterday(start: NaiveDate) -> DateRanges {
    daily_ranges_till_yesterday_as_of(start, today())
}

/// Exactly one window: the day before `today`.
#[must_use]
pub fn daily_range_yesterday_as_of(today: NaiveDate) -> DateRanges {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    daily_ranges(yesterday, today)
}

/// Exactly one window: yesterday on the local clock.
#[must_use]
pub fn daily_range_yesterday() -> DateRanges {
    daily_range_yesterday_as_of(today())
}

/// Maps aggregation telemetry types to their window granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRangeRegistry {
    entries: BTreeMap<TelemetryType, Granularity>,
}

impl DateRangeRegistry {
    /// Registry with no entries.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a granularity; a second registration for one type fails.
    pub fn register(
        &mut self,
        telemetry_type: TelemetryType,
        granularity: Granularity,
    ) -> Result<(), TelemetryError> {
        if self.entries.contains_key(&telemetry_type) {
            return Err(TelemetryError::DateRangeMethodRegisteredTwice {
                telemetry_type: telemetry_type.to_string(),
            });
        }
        self.entries.insert(telemetry_type, granularity);
        Ok(())
    }

    /// True when `telemetry_type` has a granularity.
    #[must_use]
    pub fn is_registered(&self, telemetry_type: TelemetryType) -> bool {
        self.entries.contains_key(&telemetry_type)
    }

    /// Granularity for `telemetry_type`.
    pub fn granularity(&self, telemetry_type: TelemetryType) -> Result<Granularity, TelemetryError> {
        self.entries.get(&telemetry_type).copied().ok_or_else(|| {
            TelemetryError::RequestedDateTimeRangeMethodNotFound {
                telemetry_type: telemetry_type.to_string(),
            }
        })
    }

    /// The window of `telemetry_type` that contains `date`.
    pub fn range_for_single_date(
        &self,
        telemetry_type: TelemetryType,
        date: NaiveDate,
    ) -> Result<DateTimeRange, TelemetryError> {
        Ok(self.granularity(telemetry_type)?.range_for_single_date(date))
    }

    /// Windows of `telemetry_type` covering `[start, end]`.
    pub fn ranges(
        &self,
        telemetry_type: TelemetryType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRanges, TelemetryError> {
        Ok(self.granularity(telemetry_type)?.ranges(start, end))
    }
}

impl Default for DateRangeRegistry {
    /// Daily, weekly and monthly rollups plus `SINGLE` (per-day partial rollups).
    fn default() -> Self {
        let entries = [
            (TelemetryType::DailyAggr, Granularity::Daily),
            (TelemetryType::WeeklyAggr, Granularity::Weekly),
            (TelemetryType::MonthlyAggr, Granularity::Monthly),
            (TelemetryType::Single, Granularity::Daily),
        ];
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, String> {
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| "bad date".to_string())
    }

    #[test]
    fn daily_ranges_cover_span_exclusively() -> Result<(), String> {
        let ranges: Vec<_> = daily_ranges(date(2024, 2, 27)?, date(2024, 3, 2)?).collect();
        assert_eq!(ranges.len(), 4, "leap day included");
        assert_eq!(ranges[0].from_date, midnight(date(2024, 2, 27)?));
        assert_eq!(ranges[3].to_date, midnight(date(2024, 3, 2)?));
        Ok(())
    }

    #[test]
    fn start_after_end_yields_nothing() -> Result<(), String> {
        assert_eq!(daily_ranges(date(2024, 1, 2)?, date(2024, 1, 1)?).count(), 0);
        assert_eq!(daily_ranges(date(2024, 1, 2)?, date(2024, 1, 2)?).count(), 0);
        Ok(())
    }

    #[test]
    fn ranges_are_restartable() -> Result<(), String> {
        let ranges = daily_ranges(date(2024, 1, 1)?, date(2024, 1, 8)?);
        let first: Vec<_> = ranges.clone().collect();
        let second: Vec<_> = ranges.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
        Ok(())
    }

    #[test]
    fn single_date_windows() -> Result<(), String> {
        // 2024-05-15 is a Wednesday.
        let week = weekly_range_for_single_date(date(2024, 5, 15)?);
        assert_eq!(week.from_date, midnight(date(2024, 5, 13)?));
        assert_eq!(week.to_date, midnight(date(2024, 5, 20)?));

        let month = monthly_range_for_single_date(date(2024, 12, 31)?);
        assert_eq!(month.from_date, midnight(date(2024, 12, 1)?));
        assert_eq!(month.to_date, midnight(date(2025, 1, 1)?));

        let day = daily_range_for_single_date(date(2024, 5, 15)?);
        assert_eq!(day, DateTimeRange::from_dates(date(2024, 5, 15)?, date(2024, 5, 16)?));
        Ok(())
    }

    #[test]
    fn yesterday_is_exactly_one_window() -> Result<(), String> {
        let ranges: Vec<_> = daily_range_yesterday_as_of(date(2024, 3, 1)?).collect();
        assert_eq!(
            ranges,
            vec![DateTimeRange::from_dates(date(2024, 2, 29)?, date(2024, 3, 1)?)]
        );

        let till: Vec<_> =
            daily_ranges_till_yesterday_as_of(date(2024, 2, 26)?, date(2024, 3, 1)?).collect();
        assert_eq!(till.len(), 4);
        Ok(())
    }

    #[test]
    fn monthly_ranges_snap_to_first_of_month() -> Result<(), String> {
        let ranges: Vec<_> = monthly_ranges(date(2024, 1, 20)?, date(2024, 4, 1)?).collect();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0].from_date, midnight(date(2024, 1, 1)?));
        assert_eq!(ranges[1].from_date, midnight(date(2024, 2, 1)?));
        assert_eq!(ranges[2].to_date, midnight(date(2024, 4, 1)?));
        Ok(())
    }

    #[test]
    fn registry_lookups() -> Result<(), TelemetryError> {
        let registry = DateRangeRegistry::default();
        assert_eq!(
            registry.granularity(TelemetryType::WeeklyAggr)?,
            Granularity::Weekly
        );
        assert_eq!(
            registry.granularity(TelemetryType::QuarterlyAggr),
            Err(TelemetryError::RequestedDateTimeRangeMethodNotFound {
                telemetry_type: "QUARTERLY_AGGR".to_string()
            })
        );

        let mut registry = DateRangeRegistry::empty();
        registry.register(TelemetryType::DailyAggr, Granularity::Daily)?;
        assert!(
            registry
                .register(TelemetryType::DailyAggr, Granularity::Weekly)
                .is_err()
        );
        assert!(!registry.is_registered(TelemetryType::MonthlyAggr));
        Ok(())
    }

    #[test]
    fn contains_is_half_open() -> Result<(), String> {
        let range = daily_range_for_single_date(date(2024, 1, 1)?);
        assert!(range.contains(range.from_date));
        assert!(!range.contains(range.to_date));
        Ok(())
    }
}
