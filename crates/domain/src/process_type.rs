//! Process types and their legal sub-processes.

use crate::errors::TelemetryError;
use crate::sub_process::SubProcessKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `create_data_from_url` process type.
pub const CREATE_DATA_FROM_URL: &str = "create_data_from_url";
/// `create_data_from_api` process type.
pub const CREATE_DATA_FROM_API: &str = "create_data_from_api";
/// `create_data_from_file` process type.
pub const CREATE_DATA_FROM_FILE: &str = "create_data_from_file";
/// `upload_data` process type.
pub const UPLOAD_DATA: &str = "upload_data";

/// Sub-processes of the `create_data_*` process types.
pub const DEFAULT_CREATE_DATA_SUB_PROCESSES: [&str; 3] =
    ["RETRIEVE_RAW_DATA", "DATA_CONVERSION", "DATA_STORAGE"];

/// Sub-processes of the `upload_data` process type.
pub const DEFAULT_UPLOAD_DATA_SUB_PROCESSES: [&str; 3] =
    ["DATA_SELECTION", "DATA_CONVERSION", "DATA_UPLOAD"];

/// A category of pipeline and its declared sub-processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessType {
    name: String,
    sub_processes: Vec<String>,
}

impl ProcessType {
    /// Declare a process type.
    pub fn new<I, S>(name: impl Into<String>, sub_processes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            sub_processes: sub_processes.into_iter().map(Into::into).collect(),
        }
    }

    /// Process type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared sub-process names.
    #[must_use]
    pub fn sub_processes(&self) -> &[String] {
        &self.sub_processes
    }

    /// True when `sub_process` is declared.
    #[must_use]
    pub fn has_sub_process(&self, sub_process: &str) -> bool {
        self.sub_processes.iter().any(|name| name == sub_process)
    }
}

/// Explicit registry of process types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessTypeRegistry {
    entries: BTreeMap<String, ProcessType>,
}

impl ProcessTypeRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in process types.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Register the built-in process types, skipping names already present.
    pub fn register_defaults(&mut self) {
        let defaults = [
            ProcessType::new(CREATE_DATA_FROM_URL, DEFAULT_CREATE_DATA_SUB_PROCESSES),
            ProcessType::new(CREATE_DATA_FROM_API, DEFAULT_CREATE_DATA_SUB_PROCESSES),
            ProcessType::new(CREATE_DATA_FROM_FILE, DEFAULT_CREATE_DATA_SUB_PROCESSES),
            ProcessType::new(UPLOAD_DATA, DEFAULT_UPLOAD_DATA_SUB_PROCESSES),
        ];
        for process_type in defaults {
            self.entries
                .entry(process_type.name.clone())
                .or_insert(process_type);
        }
    }

    /// Register a process type; duplicate names fail.
    pub fn register(&mut self, process_type: ProcessType) -> Result<(), TelemetryError> {
        if self.entries.contains_key(process_type.name()) {
            return Err(TelemetryError::ProcessTypeRegisteredTwice {
                process_type: process_type.name,
            });
        }
        self.entries.insert(process_type.name.clone(), process_type);
        Ok(())
    }

    /// True when `name` is registered.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up a registered process type.
    pub fn get(&self, name: &str) -> Result<&ProcessType, TelemetryError> {
        self.entries
            .get(name)
            .ok_or_else(|| TelemetryError::ProcessTypeNotRegistered {
                process_type: name.to_string(),
            })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Check `sub_process` against the declaration of `process_type`.
    pub fn validate_sub_process(
        &self,
        process_type: &str,
        sub_process: &str,
    ) -> Result<SubProcessKey, TelemetryError> {
        let declared = self.get(process_type)?;
        if !declared.has_sub_process(sub_process) {
            return Err(TelemetryError::InvalidSubProcess {
                process_type: process_type.to_string(),
                sub_process: sub_process.to_string(),
            });
        }
        SubProcessKey::parse(sub_process)
    }
}
