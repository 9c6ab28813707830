use chrono::NaiveDate;
use pipeline_telemetry_infra::InfraError;
use pipeline_telemetry_shared::{ErrorKind, namespaces};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    InvalidInput = 2,
    Io = 3,
    Internal = 1,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug)]
pub enum CliError {
    /// `--from` lies after `--to`.
    ReversedSpan { from: NaiveDate, to: NaiveDate },
    /// Config, telemetry or storage failure reported by the infra layer.
    Infra(InfraError),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ReversedSpan { .. } => ExitCode::InvalidInput,
            Self::Infra(error) => infra_exit_code(error),
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}

/// Expected envelopes are caller mistakes; unexpected storage failures are I/O.
#[must_use]
pub fn infra_exit_code(error: &InfraError) -> ExitCode {
    match error.kind {
        ErrorKind::Expected => ExitCode::InvalidInput,
        ErrorKind::Unexpected if error.code.namespace() == namespaces::STORAGE => ExitCode::Io,
        ErrorKind::Invariant | ErrorKind::Unexpected => ExitCode::Internal,
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReversedSpan { from, to } => {
                write!(formatter, "invalid span: --from {from} is after --to {to}")
            },
            Self::Infra(error) => write!(formatter, "{}: {}", error.code, error.message),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<InfraError> for CliError {
    fn from(error: InfraError) -> Self {
        Self::Infra(error)
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_telemetry_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

    fn storage_failure() -> Result<(), CliError> {
        Err(ErrorEnvelope::unexpected(
            ErrorCode::storage("sqlite"),
            "sqlite open failed",
            ErrorClass::NonRetriable,
        ))?;
        Ok(())
    }

    #[test]
    fn infra_errors_convert_with_question_mark() -> Result<(), Box<dyn std::error::Error>> {
        let Err(error) = storage_failure() else {
            return Err("expected a storage failure".into());
        };
        assert!(matches!(error, CliError::Infra(_)));
        assert_eq!(error.exit_code(), ExitCode::Io);
        assert_eq!(error.to_string(), "storage:sqlite: sqlite open failed");
        Ok(())
    }

    #[test]
    fn envelope_kind_selects_exit_code() {
        let config = ErrorEnvelope::expected(ErrorCode::config("invalid_env_enum"), "bad");
        let closed = ErrorEnvelope::invariant(ErrorCode::protocol("telemetry_closed"), "closed");
        let core = ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            "boom",
            ErrorClass::NonRetriable,
        );

        assert_eq!(CliError::from(config).exit_code(), ExitCode::InvalidInput);
        assert_eq!(CliError::from(closed).exit_code(), ExitCode::Internal);
        assert_eq!(CliError::from(core).exit_code(), ExitCode::Internal);
    }

    #[test]
    fn local_errors_keep_their_exit_codes() -> Result<(), Box<dyn std::error::Error>> {
        let from = NaiveDate::from_ymd_opt(2024, 2, 1).ok_or("bad date")?;
        let to = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
        assert_eq!(
            CliError::ReversedSpan { from, to }.exit_code(),
            ExitCode::InvalidInput
        );
        assert_eq!(
            CliError::Io(std::io::Error::other("io")).exit_code(),
            ExitCode::Io
        );
        let Err(json_error) = serde_json::from_str::<serde_json::Value>("not-json") else {
            return Err("expected serialization error".into());
        };
        assert_eq!(
            CliError::Serialization(json_error).exit_code(),
            ExitCode::Internal
        );
        Ok(())
    }
}
