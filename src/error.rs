//! Exit codes and structured fatal errors.

use serde::Serialize;

use crate::config::ConfigError;
use crate::policy::PolicyParseError;

/// Process exit codes.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected failure, malformed policy)
/// - 2: No duplicates found (completed normally, no duplicates)
/// - 3: Partial success (some files or workers failed, the rest completed)
/// - 64: Configuration error (incompatible options)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: duplicates were found and processed.
    Success = 0,
    /// General error: the run stopped before any destructive action.
    GeneralError = 1,
    /// No duplicates: scan completed but nothing was duplicated.
    NoDuplicates = 2,
    /// Partial success: completed with recovered file or worker failures.
    PartialSuccess = 3,
    /// Configuration error: the requested options cannot be combined.
    ConfigError = 64,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::ConfigError => "DS064",
        }
    }

    /// Exit code for a fatal error.
    ///
    /// Configuration errors anywhere in the chain map to
    /// [`ExitCode::ConfigError`]; everything else is a general error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.chain().any(|cause| cause.is::<ConfigError>()) {
            Self::ConfigError
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the policy document was at fault
    pub policy_error: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            policy_error: err.chain().any(|cause| cause.is::<PolicyParseError>()),
        }
    }
}
