//! Built-in data validators.

use pipeline_telemetry_ports::{DataValidatorPort, SubProcessKey, ValidationErrorCode};
use serde_json::Value;
use std::collections::BTreeMap;

/// Validator that checks a payload object carries non-null required keys.
///
/// Each missing key yields the code `missing_<key>`. Non-object payloads yield
/// `not_an_object`. Sub-processes without rules always pass.
#[derive(Debug, Clone, Default)]
pub struct RequiredKeysValidator {
    rules: BTreeMap<Box<str>, Vec<Box<str>>>,
}

impl RequiredKeysValidator {
    /// Create a validator without rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `keys` on payloads added to `sub_process`.
    #[must_use]
    pub fn require<I, S>(mut self, sub_process: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        self.rules
            .entry(sub_process.into())
            .or_default()
            .extend(keys.into_iter().map(Into::into));
        self
    }
}

impl DataValidatorPort for RequiredKeysValidator {
    fn validate(&self, sub_process: &SubProcessKey, data: &Value) -> Vec<ValidationErrorCode> {
        let Some(required) = self.rules.get(sub_process.as_str()) else {
            return Vec::new();
        };
        let Value::Object(map) = data else {
            return vec!["not_an_object".into()];
        };
        required
            .iter()
            .filter(|key| map.get(key.as_ref()).is_none_or(Value::is_null))
            .map(|key| format!("missing_{key}").into_boxed_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_keys_report_each_missing_key() -> Result<(), Box<dyn std::error::Error>> {
        let validator = RequiredKeysValidator::new().require("DATA_STORAGE", ["station", "temp"]);
        let storage = SubProcessKey::parse("DATA_STORAGE")?;
        let other = SubProcessKey::parse("DATA_LOAD")?;

        assert!(validator.validate(&storage, &json!({"station": 1, "temp": 2.5})).is_empty());
        assert_eq!(
            validator.validate(&storage, &json!({"station": 1, "temp": null})),
            vec![Box::from("missing_temp")]
        );
        assert_eq!(
            validator.validate(&storage, &json!([1, 2])),
            vec![Box::from("not_an_object")]
        );
        assert!(validator.validate(&other, &json!(null)).is_empty());
        Ok(())
    }
}
