//! Error handling for rulesmith
//!
//! Two layers of error reporting exist:
//!
//! 1. Expected, document-scoped problems (a malformed metadata block, an
//!    inheritance cycle, a bad `when:` expression) are never errors in the Rust
//!    sense. They are recorded as [`Diagnostic`](super::Diagnostic) values and the
//!    run completes.
//! 2. Problems that stop the tool itself (no configuration file, a source
//!    directory that does not exist, a write that fails) are [`RulesmithError`]
//!    values propagated through `anyhow`, then turned into an [`ErrorContext`]
//!    with a suggestion by [`user_friendly_error`] for display.
//!
//! # Examples
//!
//! ```rust,no_run
//! use rulesmith::core::{ErrorContext, RulesmithError};
//!
//! let context = ErrorContext::new(RulesmithError::ConfigNotFound {
//!     searched_from: "/work/app".to_string(),
//! })
//! .with_suggestion("Run 'rulesmith build' from the project root");
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::constants::CONFIG_FILE_NAME;

/// The main error type for rulesmith operations that cannot be scoped to a
/// single document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesmithError {
    /// No `rulesmith.toml` in the working directory or any parent.
    #[error("No {CONFIG_FILE_NAME} found in {searched_from} or any parent directory")]
    ConfigNotFound {
        /// Directory the search started from
        searched_from: String,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Invalid configuration file {file}: {reason}")]
    ConfigParseError {
        file: String,
        reason: String,
    },

    /// A configured source directory is missing.
    #[error("Source '{name}' not found at {path}")]
    SourceNotFound {
        name: String,
        path: String,
    },

    /// A platform identifier that no generator handles.
    #[error("Unknown platform '{name}'{}", suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownPlatform {
        name: String,
        suggestion: Option<String>,
    },

    /// Reading or writing a file failed.
    #[error("File system error during {operation} on {path}: {reason}")]
    FileSystemError {
        operation: String,
        path: String,
        reason: String,
    },

    /// A generated artifact would be written outside the output directory.
    #[error("Refusing to write {path}: path escapes the output directory")]
    UnsafeOutputPath {
        path: String,
    },

    /// Resolution finished with diagnostics that the failure policy rejects.
    #[error("Resolution failed with {errors} error(s) and {warnings} warning(s)")]
    ResolutionFailed {
        errors: usize,
        warnings: usize,
        strict: bool,
    },

    /// `check` found generated files that differ from what is on disk.
    #[error("{count} generated file(s) are missing or out of date")]
    OutOfDate {
        count: usize,
    },

    /// Anything else.
    #[error("{message}")]
    Other {
        message: String,
    },
}

/// A [`RulesmithError`] decorated with optional details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: RulesmithError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: RulesmithError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with an actionable suggestion.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(rulesmith_error) = error.downcast_ref::<RulesmithError>() {
        return create_error_context(rulesmith_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(RulesmithError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                    reason: io_error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the output directory");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(RulesmithError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                    reason: io_error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(RulesmithError::ConfigParseError {
            file: CONFIG_FILE_NAME.to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion(format!(
            "Check the TOML syntax in {CONFIG_FILE_NAME}. Verify quotes, brackets, and table names"
        ));
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(RulesmithError::Other {
        message,
    })
}

fn create_error_context(error: RulesmithError) -> ErrorContext {
    match &error {
        RulesmithError::ConfigNotFound {
            ..
        } => ErrorContext::new(error).with_suggestion(format!(
            "Create a {CONFIG_FILE_NAME} in your project root, or pass --config <path>"
        )),
        RulesmithError::ConfigParseError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Fix the configuration file; see the [project] and [[sources]] tables"),
        RulesmithError::SourceNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the 'path' of the source in the configuration file")
            .with_details("Source paths are resolved relative to the configuration file"),
        RulesmithError::UnknownPlatform {
            ..
        } => ErrorContext::new(error).with_details(format!(
            "Known platforms: {}",
            crate::core::Platform::ids().collect::<Vec<_>>().join(", ")
        )),
        RulesmithError::ResolutionFailed {
            strict: true,
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Fix the warnings above or run without --strict"),
        RulesmithError::ResolutionFailed {
            ..
        } => ErrorContext::new(error).with_suggestion("Fix the errors reported above and rebuild"),
        RulesmithError::OutOfDate {
            ..
        } => ErrorContext::new(error).with_suggestion("Run 'rulesmith build' to regenerate"),
        _ => ErrorContext::new(error),
    }
}
