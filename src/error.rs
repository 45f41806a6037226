//! Unified error handling for procbench
//!
//! Per-worker and per-process failures never surface here: they degrade into
//! failure records and inert metrics. Only problems that stop a whole run
//! (launch failures, bad configuration, unwritable artifacts) are errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum BenchError {
    /// The worker OS process could not be created at all
    #[error("Failed to launch worker '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Record serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Configuration parsed but is not usable
    #[error("Validation error ({field}): {message}")]
    Validation { field: String, message: String },

    /// Result or report file could not be written
    #[error("Failed to write artifact {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Process,
    Config,
    Validation,
    Filesystem,
}

impl ErrorCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ErrorCategory::Process => "Process",
            ErrorCategory::Config => "Configuration",
            ErrorCategory::Validation => "Validation",
            ErrorCategory::Filesystem => "Filesystem",
        }
    }
}

impl BenchError {
    pub fn config(message: impl Into<String>) -> Self {
        BenchError::Config {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BenchError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            BenchError::Launch { .. } => ErrorCategory::Process,
            BenchError::Serialize(_) | BenchError::Config { .. } => ErrorCategory::Config,
            BenchError::Validation { .. } => ErrorCategory::Validation,
            BenchError::Artifact { .. } => ErrorCategory::Filesystem,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            BenchError::Launch { program, source } => format!(
                "Could not start worker '{}': {}. Check --worker or {}.",
                program,
                source,
                crate::config::WORKER_BIN_ENV
            ),
            BenchError::Serialize(err) => format!("Could not encode record: {}", err),
            BenchError::Config { message } => format!("Configuration problem: {}", message),
            BenchError::Validation { field, message } => {
                format!("Invalid value for '{}': {}", field, message)
            }
            BenchError::Artifact { path, source } => {
                format!("Could not write {}: {}", path.display(), source)
            }
        }
    }
}

/// Result type alias for convenience
pub type BenchResult<T> = Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let launch = BenchError::Launch {
            program: "missing-worker".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(launch.category(), ErrorCategory::Process);
        assert!(launch.user_message().contains("missing-worker"));
        assert!(launch
            .user_message()
            .contains(crate::config::WORKER_BIN_ENV));

        let invalid = BenchError::validation("seed", "duplicate seed 3");
        assert_eq!(invalid.category(), ErrorCategory::Validation);
        assert_eq!(invalid.category().display_name(), "Validation");
        assert!(invalid.to_string().contains("duplicate seed 3"));
    }

    #[test]
    fn test_artifact_error_names_path() {
        let err = BenchError::Artifact {
            path: PathBuf::from("/nowhere/report.txt"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.category(), ErrorCategory::Filesystem);
        assert!(err.to_string().contains("/nowhere/report.txt"));
    }
}
