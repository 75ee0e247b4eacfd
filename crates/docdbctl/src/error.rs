//! CLI error type and diagnostics
//!
//! Wraps the core error with user-facing suggestions and cargo-style
//! colored output on stderr.

use colored::Colorize;
use thiserror::Error;

use docdbctl_core::CoreError;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: invalid arguments: --max-interval: value 0 is outside the accepted range 1 - 100 (out of range)
///
///   tip: check the accepted values:
///       docdbctl account update --help
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tips: Vec::new(),
        }
    }

    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);
        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the docdbctl binary.
#[derive(Error, Debug)]
pub enum DocdbCtlError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("output formatting error: {message}")]
    Output { message: String },
}

pub type Result<T> = std::result::Result<T, DocdbCtlError>;

impl From<anyhow::Error> for DocdbCtlError {
    fn from(err: anyhow::Error) -> Self {
        DocdbCtlError::Output {
            message: err.to_string(),
        }
    }
}

impl DocdbCtlError {
    /// Helpful follow-ups for resolving this error, each a description with
    /// the commands to run.
    pub fn suggestions(&self) -> Vec<(String, Vec<String>)> {
        match self {
            DocdbCtlError::Core(CoreError::Validation(_)) => vec![(
                "check the accepted values:".to_string(),
                vec!["docdbctl <command> --help".to_string()],
            )],
            DocdbCtlError::Core(CoreError::UnknownFlag { scope, .. }) => vec![(
                "list the flags for this command:".to_string(),
                vec![format!("docdbctl {} --help", scope)],
            )],
            DocdbCtlError::Core(CoreError::UnknownCommand { .. }) => vec![(
                "list available commands:".to_string(),
                vec!["docdbctl --help".to_string()],
            )],
            DocdbCtlError::Core(CoreError::Config(_)) => vec![
                (
                    "pass --api-url, or set DOCDBCTL_API_URL".to_string(),
                    vec![],
                ),
                (
                    "check the config file with profiles and default_profile".to_string(),
                    vec![],
                ),
            ],
            DocdbCtlError::Core(err) if err.is_unauthorized() => vec![(
                "check the API token: --api-token or DOCDBCTL_API_TOKEN".to_string(),
                vec![],
            )],
            DocdbCtlError::Core(err) if err.is_not_found() => vec![(
                "verify the account name:".to_string(),
                vec!["docdbctl account list".to_string()],
            )],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());
        for (description, commands) in self.suggestions() {
            let commands: Vec<&str> = commands.iter().map(String::as_str).collect();
            diag = diag.tip(&description, &commands);
        }
        diag.print();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdbctl_core::{RestError, ValidationError, ValidationKind};

    #[test]
    fn validation_error_suggests_help() {
        let err: DocdbCtlError = CoreError::Validation(vec![ValidationError::new(
            ValidationKind::OutOfRange,
            "max-interval",
            "value 0 is outside the accepted range 1 - 100",
        )])
        .into();
        assert!(err.to_string().contains("--max-interval"));
        let suggestions = err.suggestions();
        assert!(!suggestions.is_empty());
        let (_, commands) = &suggestions[0];
        assert_eq!(commands, &["docdbctl <command> --help"]);
    }

    #[test]
    fn unknown_flag_suggests_scope_help() {
        let err: DocdbCtlError = CoreError::UnknownFlag {
            scope: "account update".to_string(),
            flag: "bogus".to_string(),
        }
        .into();
        let suggestions = err.suggestions();
        let (_, commands) = &suggestions[0];
        assert_eq!(commands, &["docdbctl account update --help"]);
    }

    #[test]
    fn unauthorized_suggests_token() {
        let err: DocdbCtlError = CoreError::from(RestError::Unauthorized).into();
        assert!(err.suggestions().iter().any(|(d, _)| d.contains("API token")));
    }
}
