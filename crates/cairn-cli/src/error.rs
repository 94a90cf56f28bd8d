//! CLI error types with exit code handling
//!
//! Library errors are flattened into a message plus optional help text, and
//! each variant carries the exit code of the stage that failed.

use miette::Diagnostic;
use thiserror::Error;

use cairn_bundle::BundleError;
use cairn_core::CoreError;
use cairn_resolve::ResolveError;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Missing or malformed bundle
    #[error("Bundle error: {message}")]
    #[diagnostic(code(cairn::cli::bundle))]
    Bundle {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A `$ref` could not be resolved
    #[error("Resolve error: {message}")]
    #[diagnostic(code(cairn::cli::resolve))]
    Resolve {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A step's backend failed
    #[error("Provisioner error: {message}")]
    #[diagnostic(code(cairn::cli::provisioner))]
    Provisioner {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Generated output failed validation
    #[error("Validation failed: {message}")]
    #[diagnostic(code(cairn::cli::validation))]
    Validation { message: String },

    #[error("Linting failed with {errors} error(s) and {warnings} warning(s)")]
    #[diagnostic(code(cairn::cli::lint))]
    LintFailed { errors: usize, warnings: usize },

    #[error("IO error: {message}")]
    #[diagnostic(code(cairn::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Bundle { .. } => exit_codes::BUNDLE_ERROR,
            CliError::Resolve { .. } => exit_codes::RESOLVE_ERROR,
            CliError::Provisioner { .. } => exit_codes::PROVISIONER_ERROR,
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::LintFailed { errors: 0, .. } => exit_codes::ERROR,
            CliError::LintFailed { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
        }
    }

    pub fn lint_failed(errors: usize, warnings: usize) -> Self {
        Self::LintFailed { errors, warnings }
    }
}

fn help_of(err: &dyn Diagnostic) -> Option<String> {
    err.help().map(|help| help.to_string())
}

impl From<BundleError> for CliError {
    fn from(err: BundleError) -> Self {
        let message = err.to_string();
        let help = help_of(&err);

        match err {
            BundleError::Core(CoreError::Io(_)) | BundleError::Write { .. } | BundleError::Prompt(_) => {
                CliError::Io { message }
            }
            BundleError::Core(_) => CliError::Bundle { message, help },
            BundleError::Resolve(_) => CliError::Resolve { message, help },
            BundleError::Provisioner(_) => CliError::Provisioner { message, help },
            BundleError::SchemaShape { .. } => CliError::Validation { message },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        BundleError::from(err).into()
    }
}

impl From<ResolveError> for CliError {
    fn from(err: ResolveError) -> Self {
        BundleError::from(err).into()
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_bundle_maps_to_bundle_error() {
        let err: CliError = CoreError::BundleNotFound {
            path: PathBuf::from("nowhere/bundle.yaml"),
        }
        .into();

        assert_eq!(err.exit_code(), exit_codes::BUNDLE_ERROR);
        assert!(err.to_string().contains("nowhere/bundle.yaml"));
        assert!(matches!(err, CliError::Bundle { help: Some(_), .. }));
    }

    #[test]
    fn test_resolve_error_code() {
        let err: CliError = ResolveError::UnsupportedReference {
            reference: "/abs.json".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_codes::RESOLVE_ERROR);
    }

    #[test]
    fn test_lint_exit_codes() {
        assert_eq!(CliError::lint_failed(2, 0).exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(CliError::lint_failed(0, 3).exit_code(), exit_codes::ERROR);
    }
}
