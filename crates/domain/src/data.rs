//! Per-sub-process counter bundle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

/// Named counters keyed by counter or error-code name.
pub type CounterMap = BTreeMap<String, i64>;

/// Counters for one sub-process: base, fail, custom and error tallies.
///
/// Increments are expected to be non-negative; negatives are accepted
/// without clamping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryData {
    /// Number of units processed.
    pub base_counter: i64,
    /// Number of failed units.
    pub fail_counter: i64,
    /// Named custom counters.
    pub counters: CounterMap,
    /// Error-code counters.
    pub errors: CounterMap,
}

impl TelemetryData {
    /// Create an empty counter bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase the base counter.
    pub const fn increase_base_count(&mut self, increment: i64) {
        self.base_counter += increment;
    }

    /// Increase the fail counter.
    pub const fn increase_fail_count(&mut self, increment: i64) {
        self.fail_counter += increment;
    }

    /// Increase a named custom counter, creating it at zero first.
    pub fn increase_custom_count(&mut self, counter: &str, increment: i64) {
        bump(&mut self.counters, counter, increment);
    }

    /// Increase an error-code counter, creating it at zero first.
    pub fn increase_error_count(&mut self, error_code: &str, increment: i64) {
        bump(&mut self.errors, error_code, increment);
    }

    /// Value of a custom counter (0 when absent).
    #[must_use]
    pub fn custom_count(&self, counter: &str) -> i64 {
        self.counters.get(counter).copied().unwrap_or_default()
    }

    /// Value of an error counter (0 when absent).
    #[must_use]
    pub fn error_count(&self, error_code: &str) -> i64 {
        self.errors.get(error_code).copied().unwrap_or_default()
    }

    /// Accumulate `other` into `self` in place.
    ///
    /// Base and fail counters sum; custom and error maps sum per key over the
    /// union of keys.
    pub fn merge(&mut self, other: &Self) {
        self.base_counter += other.base_counter;
        self.fail_counter += other.fail_counter;
        for (counter, increment) in &other.counters {
            bump(&mut self.counters, counter, *increment);
        }
        for (error_code, increment) in &other.errors {
            bump(&mut self.errors, error_code, *increment);
        }
    }

    /// Pure variant of [`TelemetryData::merge`].
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.merge(other);
        self
    }
}

fn bump(map: &mut CounterMap, key: &str, increment: i64) {
    match map.get_mut(key) {
        Some(value) => *value += increment,
        None => {
            map.insert(key.to_string(), increment);
        },
    }
}

impl AddAssign<&Self> for TelemetryData {
    fn add_assign(&mut self, other: &Self) {
        self.merge(other);
    }
}

impl Add<&TelemetryData> for TelemetryData {
    type Output = Self;

    fn add(self, other: &TelemetryData) -> Self {
        self.merged(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_create_missing_keys() {
        let mut data = TelemetryData::new();
        data.increase_base_count(3);
        data.increase_fail_count(1);
        data.increase_custom_count("rows", 10);
        data.increase_custom_count("rows", 5);
        data.increase_error_count("E001", 2);

        assert_eq!(data.base_counter, 3);
        assert_eq!(data.fail_counter, 1);
        assert_eq!(data.custom_count("rows"), 15);
        assert_eq!(data.error_count("E001"), 2);
        assert_eq!(data.error_count("E404"), 0);
    }

    #[test]
    fn merge_sums_over_key_union() {
        let mut left = TelemetryData::new();
        left.increase_base_count(1);
        left.increase_custom_count("a", 1);
        left.increase_error_count("E1", 1);

        let mut right = TelemetryData::new();
        right.increase_base_count(2);
        right.increase_fail_count(1);
        right.increase_custom_count("b", 4);
        right.increase_error_count("E1", 2);

        left += &right;

        assert_eq!(left.base_counter, 3);
        assert_eq!(left.fail_counter, 1);
        assert_eq!(left.custom_count("a"), 1);
        assert_eq!(left.custom_count("b"), 4);
        assert_eq!(left.error_count("E1"), 3);
        assert_eq!(right.base_counter, 2, "right operand is untouched");
    }

    #[test]
    fn deserializes_missing_maps_as_empty() -> Result<(), serde_json::Error> {
        let data: TelemetryData = serde_json::from_str(r#"{"base_counter": 2}"#)?;
        assert_eq!(data.base_counter, 2);
        assert!(data.counters.is_empty());
        assert!(data.errors.is_empty());
        Ok(())
    }
}
