//! Data validation boundary contract.

use pipeline_telemetry_domain::SubProcessKey;

/// Error code returned by a validator, tallied as an error counter.
pub type ValidationErrorCode = Box<str>;

/// Boundary contract for the rule engine that checks sub-process payloads.
///
/// Called once per `add_data` event; an empty result means the payload passed.
pub trait DataValidatorPort: Send + Sync {
    /// Validate `data` against the rules for `sub_process`.
    fn validate(&self, sub_process: &SubProcessKey, data: &serde_json::Value)
    -> Vec<ValidationErrorCode>;
}
