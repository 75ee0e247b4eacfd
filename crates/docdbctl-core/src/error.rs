//! Unified error handling for docdbctl-core
//!
//! Schema authoring mistakes, user-facing validation failures, configuration
//! problems, and remote management-plane errors all flow through one type so
//! callers can classify them with the `is_*` helpers.

use thiserror::Error;

use crate::client::RestError;
use crate::config::ConfigError;
use crate::validate::{ValidationError, ValidationKind};

/// Core error type for the binder and its collaborators.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Schema authoring mistake, fatal at startup.
    #[error("flag '--{flag}' is already registered at scope '{scope}'")]
    DuplicateFlag { scope: String, flag: String },

    /// Unknown flag for the given command scope.
    #[error("unknown flag '--{flag}' for '{scope}'")]
    UnknownFlag { scope: String, flag: String },

    /// Command path with no bound operation.
    #[error("unknown command '{path}'")]
    UnknownCommand { path: String },

    /// One or more flags failed validation. Never silently coerced.
    #[error("invalid arguments: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    /// Opaque passthrough from the management plane. Not retried or
    /// reinterpreted.
    #[error(transparent)]
    Remote(#[from] RestError),

    /// Configuration file or profile problem.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// True for errors the user can fix by re-invoking with corrected input.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::UnknownFlag { .. } | CoreError::UnknownCommand { .. }
        )
    }

    /// True if any contained validation failure has the given kind.
    #[must_use]
    pub fn has_validation_kind(&self, kind: ValidationKind) -> bool {
        match self {
            CoreError::Validation(errors) => errors.iter().any(|e| e.kind == kind),
            _ => false,
        }
    }

    /// True for 404-shaped remote errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Remote(e) if e.is_not_found())
    }

    /// True for 401/403-shaped remote errors.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Remote(e) if e.is_unauthorized())
    }

    /// True for 5xx-shaped remote errors.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, CoreError::Remote(e) if e.is_server_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_join_in_display() {
        let err = CoreError::Validation(vec![
            ValidationError::new(ValidationKind::OutOfRange, "max-interval", "value 0 is low"),
            ValidationError::new(ValidationKind::BadFormat, "kind", "'x' is not valid"),
        ]);
        let text = err.to_string();
        assert!(text.contains("--max-interval"));
        assert!(text.contains("--kind"));
        assert!(err.is_user_error());
        assert!(err.has_validation_kind(ValidationKind::OutOfRange));
        assert!(!err.has_validation_kind(ValidationKind::Missing));
    }

    #[test]
    fn remote_classification_delegates() {
        let err: CoreError = RestError::NotFound.into();
        assert!(err.is_not_found());
        assert!(!err.is_user_error());

        let err: CoreError = RestError::ServerError("boom".into()).into();
        assert!(err.is_server_error());
    }
}
