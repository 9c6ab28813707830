//! # pipeline-telemetry-shared
//!
//! Shared result types and error handling for the pipeline-telemetry workspace.
//!
//! This crate provides foundational types that are used across all other crates:
//!
//! - Result and error envelope types
//! - Secret redaction helpers for logs and config dumps
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - All public error types support serialization

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// =============================================================================
// RESULT + ERROR ENVELOPE
// =============================================================================

pub mod errors;
pub mod redaction;
pub mod result;

pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, namespaces};
pub use redaction::{REDACTED, is_secret_key, redact_if_secret};
pub use result::Result;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::errors::{ErrorClass, ErrorCode, ErrorEnvelope};
    use super::result::Result;

    #[test]
    fn shared_error_types_are_available() {
        let error = ErrorEnvelope::expected(ErrorCode::invalid_input(), "invalid");
        assert_eq!(error.kind, super::errors::ErrorKind::Expected);
        assert_eq!(error.class, ErrorClass::NonRetriable);
    }

    #[test]
    fn shared_result_defaults_to_the_envelope() {
        let value: Result<i32> = Err(ErrorEnvelope::expected(ErrorCode::invalid_input(), "x"));
        assert!(matches!(value, Err(error) if error.code.to_string() == "core:invalid_input"));
    }

    #[test]
    fn shared_crate_has_no_workspace_dependencies() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let manifest = include_str!("../Cargo.toml");
        let internal = manifest
            .lines()
            .filter(|line| line.trim_start().starts_with("pipeline-telemetry-"))
            .count();
        assert_eq!(internal, 0);
        assert!(!super::shared_crate_version().is_empty());
        Ok(())
    }
}
