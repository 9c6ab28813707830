//! Sub-process keys for the telemetry map.

use crate::errors::TelemetryError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Prefix reserved for keys generated by the telemetry core.
pub const RESERVED_PREFIX: &str = "__";

/// Key of the synthetic sub-process holding aggregation meta-counters.
pub const AGGREGATION_STATS_KEY: &str = "__aggregation_stats";

/// Name of a sub-process within one telemetry model.
///
/// User-supplied names go through [`SubProcessKey::parse`], which rejects the
/// reserved prefix; the aggregation-stats key is only reachable through
/// [`SubProcessKey::aggregation_stats`]. Deserialization is unchecked so that
/// persisted aggregates (which carry the stats key) load back.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubProcessKey(Box<str>);

impl SubProcessKey {
    /// Parse a user-facing sub-process name.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TelemetryError> {
        let raw = input.as_ref().trim();
        if raw.is_empty() || raw.starts_with(RESERVED_PREFIX) {
            return Err(TelemetryError::ReservedSubProcessName {
                name: input.as_ref().to_string(),
            });
        }
        Ok(Self(raw.to_owned().into_boxed_str()))
    }

    /// The reserved aggregation-stats key.
    #[must_use]
    pub fn aggregation_stats() -> Self {
        Self(AGGREGATION_STATS_KEY.to_owned().into_boxed_str())
    }

    /// True for keys generated by the telemetry core.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with(RESERVED_PREFIX)
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SubProcessKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for SubProcessKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SubProcessKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_accepts_plain_names() -> Result<(), TelemetryError> {
        let key = SubProcessKey::parse(" DATA_STORAGE ")?;
        assert_eq!(key.as_str(), "DATA_STORAGE");
        assert!(!key.is_reserved());
        Ok(())
    }

    #[test]
    fn parse_rejects_reserved_and_empty_names() {
        assert!(SubProcessKey::parse(AGGREGATION_STATS_KEY).is_err());
        assert!(SubProcessKey::parse("__anything").is_err());
        assert!(SubProcessKey::parse("   ").is_err());
    }

    #[test]
    fn stats_key_is_reserved() {
        assert!(SubProcessKey::aggregation_stats().is_reserved());
    }
}
