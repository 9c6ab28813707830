//! Telemetry error taxonomy and envelope mapping.

use pipeline_telemetry_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use thiserror::Error;

/// Failures raised by the telemetry core.
///
/// Variants fall into four families, each mapped to its own envelope
/// namespace: configuration (`config`), caller protocol violations
/// (`protocol`), registry lookups (`lookup`) and storage (`storage`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// Telemetry type is not one of the closed set.
    #[error("invalid telemetry type `{value}`")]
    InvalidTelemetryType {
        /// Raw value that failed to parse.
        value: String,
    },
    /// Traffic light is not GREEN, ORANGE or RED.
    #[error("invalid traffic light `{value}`")]
    InvalidTrafficLight {
        /// Raw value that failed to parse.
        value: String,
    },
    /// Process type was never registered.
    #[error("process type `{process_type}` is not registered")]
    ProcessTypeNotRegistered {
        /// Requested process type name.
        process_type: String,
    },
    /// Process type name registered a second time.
    #[error("process type `{process_type}` is already registered")]
    ProcessTypeRegisteredTwice {
        /// Duplicate process type name.
        process_type: String,
    },
    /// Sub-process is not declared by the process type.
    #[error("sub-process `{sub_process}` is not valid for process type `{process_type}`")]
    InvalidSubProcess {
        /// Process type the lookup ran against.
        process_type: String,
        /// Rejected sub-process name.
        sub_process: String,
    },
    /// Sub-process name is empty or uses the reserved prefix.
    #[error("sub-process name `{name}` is empty or reserved")]
    ReservedSubProcessName {
        /// Rejected name.
        name: String,
    },
    /// A date-range granularity was registered twice for one telemetry type.
    #[error("date-range method for `{telemetry_type}` is already registered")]
    DateRangeMethodRegisteredTwice {
        /// Telemetry type with the duplicate registration.
        telemetry_type: String,
    },
    /// Telemetry was mutated after `run_time_in_seconds` was set.
    #[error("telemetry object already closed")]
    TelemetryObjectAlreadyClosed,
    /// Sub-process initialized twice.
    #[error("sub-process `{sub_process}` is already initialized")]
    SubProcessAlreadyInitialized {
        /// Sub-process name.
        sub_process: String,
    },
    /// Fail or custom count requested before the base count.
    #[error("base count for sub-process `{sub_process}` not added")]
    BaseCountForSubProcessNotAdded {
        /// Sub-process name.
        sub_process: String,
    },
    /// No date-range generator registered for the telemetry type.
    #[error("no date-time range method registered for `{telemetry_type}`")]
    RequestedDateTimeRangeMethodNotFound {
        /// Telemetry type without a generator.
        telemetry_type: String,
    },
    /// Storage backend used while closed or never opened.
    #[error("telemetry storage `{backend}` is not initialized")]
    StorageNotInitialized {
        /// Backend name.
        backend: String,
    },
    /// Persisted record could not be encoded or decoded.
    #[error("invalid telemetry record: {reason}")]
    InvalidRecord {
        /// Decoder diagnostic.
        reason: String,
    },
}

impl TelemetryError {
    /// Stable identifier within the error namespace.
    #[must_use]
    pub const fn code_name(&self) -> &'static str {
        match self {
            Self::InvalidTelemetryType { .. } => "invalid_telemetry_type",
            Self::InvalidTrafficLight { .. } => "invalid_traffic_light",
            Self::ProcessTypeNotRegistered { .. } => "process_type_not_registered",
            Self::ProcessTypeRegisteredTwice { .. } => "process_type_registered_twice",
            Self::InvalidSubProcess { .. } => "invalid_sub_process",
            Self::ReservedSubProcessName { .. } => "reserved_sub_process_name",
            Self::DateRangeMethodRegisteredTwice { .. } => "date_range_method_registered_twice",
            Self::TelemetryObjectAlreadyClosed => "telemetry_object_already_closed",
            Self::SubProcessAlreadyInitialized { .. } => "sub_process_already_initialized",
            Self::BaseCountForSubProcessNotAdded { .. } => "base_count_for_sub_process_not_added",
            Self::RequestedDateTimeRangeMethodNotFound { .. } => {
                "requested_date_time_range_method_not_found"
            },
            Self::StorageNotInitialized { .. } => "storage_not_initialized",
            Self::InvalidRecord { .. } => "invalid_record",
        }
    }

    fn error_code(&self) -> ErrorCode {
        let code = self.code_name();
        match self {
            Self::InvalidTelemetryType { .. }
            | Self::InvalidTrafficLight { .. }
            | Self::ProcessTypeNotRegistered { .. }
            | Self::ProcessTypeRegisteredTwice { .. }
            | Self::InvalidSubProcess { .. }
            | Self::ReservedSubProcessName { .. }
            | Self::DateRangeMethodRegisteredTwice { .. } => ErrorCode::config(code),
            Self::TelemetryObjectAlreadyClosed
            | Self::SubProcessAlreadyInitialized { .. }
            | Self::BaseCountForSubProcessNotAdded { .. } => ErrorCode::protocol(code),
            Self::RequestedDateTimeRangeMethodNotFound { .. } => ErrorCode::lookup(code),
            Self::StorageNotInitialized { .. } | Self::InvalidRecord { .. } => {
                ErrorCode::storage(code)
            },
        }
    }

    /// Returns true for caller protocol violations.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::TelemetryObjectAlreadyClosed
                | Self::SubProcessAlreadyInitialized { .. }
                | Self::BaseCountForSubProcessNotAdded { .. }
        )
    }

    const fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::StorageNotInitialized { .. } | Self::InvalidRecord { .. }
        )
    }
}

impl From<TelemetryError> for ErrorEnvelope {
    fn from(error: TelemetryError) -> Self {
        let message = error.to_string();
        let mut envelope = if error.is_protocol_violation() {
            Self::invariant(error.error_code(), message)
        } else if error.is_storage() {
            Self::unexpected(error.error_code(), message, ErrorClass::NonRetriable)
        } else {
            Self::expected(error.error_code(), message)
        };

        match error {
            TelemetryError::InvalidTelemetryType { value }
            | TelemetryError::InvalidTrafficLight { value } => {
                envelope = envelope.with_metadata("value", value);
            },
            TelemetryError::ProcessTypeNotRegistered { process_type }
            | TelemetryError::ProcessTypeRegisteredTwice { process_type } => {
                envelope = envelope.with_metadata("processType", process_type);
            },
            TelemetryError::InvalidSubProcess {
                process_type,
                sub_process,
            } => {
                envelope = envelope
                    .with_metadata("processType", process_type)
                    .with_metadata("subProcess", sub_process);
            },
            TelemetryError::ReservedSubProcessName { name } => {
                envelope = envelope.with_metadata("subProcess", name);
            },
            TelemetryError::SubProcessAlreadyInitialized { sub_process }
            | TelemetryError::BaseCountForSubProcessNotAdded { sub_process } => {
                envelope = envelope.with_metadata("subProcess", sub_process);
            },
            TelemetryError::DateRangeMethodRegisteredTwice { telemetry_type }
            | TelemetryError::RequestedDateTimeRangeMethodNotFound { telemetry_type } => {
                envelope = envelope.with_metadata("telemetryType", telemetry_type);
            },
            TelemetryError::StorageNotInitialized { backend } => {
                envelope = envelope.with_metadata("backend", backend);
            },
            TelemetryError::TelemetryObjectAlreadyClosed | TelemetryError::InvalidRecord { .. } => {
            },
        }

        envelope
    }
}
