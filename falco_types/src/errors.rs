//! Error taxonomy shared by every pipeline stage.
//!
//! A partition fails with exactly one of these kinds. Stage code wraps them in
//! `anyhow::Error` with context; the engine recovers the kind with
//! [`FailureKind::of`] to decide whether a retry can help.

use std::path::PathBuf;
use thiserror::Error;

/// Why an external tool run was judged unsuccessful.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationFailure {
    #[error("Non-zero return code {}", code_str(.0))]
    NonZeroExit(Option<i32>),
    #[error("Error marker {0:?} in stderr")]
    ErrorMarker(String),
    #[error("Unexpected output on stderr")]
    UnexpectedStderr,
    #[error("No output file is found at {}", .0.display())]
    MissingOutput(PathBuf),
    #[error("Could not start process: {0}")]
    SpawnFailed(String),
}

fn code_str(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "(killed by signal)".to_string(),
    }
}

/// An external tool did not satisfy its success predicate.
///
/// The captured stdout and stderr are reported verbatim.
#[derive(Debug, Clone, Error)]
#[error(
    "{tool} failed to complete ({reason})!\n\
     Command: {command}\n\
     {tool} stdout: {stdout}\n\
     {tool} stderr: {stderr}"
)]
pub struct ToolInvocationError {
    pub tool: &'static str,
    pub reason: InvocationFailure,
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Tool output did not match the grammar its parser expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{tool}: malformed line {line_number} ({reason}): {line:?}")]
    MalformedLine {
        tool: &'static str,
        line_number: usize,
        line: String,
        reason: &'static str,
    },

    #[error("{tool}: value {value:?} for {key:?} is not a non-negative integer")]
    InvalidValue {
        tool: &'static str,
        key: String,
        value: String,
    },

    #[error("{tool}: required metric {key:?} is missing from the {section} section")]
    MissingKey {
        tool: &'static str,
        key: String,
        section: String,
    },

    #[error("{tool}: {what} is missing")]
    MissingSection { tool: &'static str, what: String },

    #[error("{tool} reported an error: {line}")]
    ToolReportedError { tool: &'static str, line: String },

    #[error("{tool}: could not read {}: {message}", .path.display())]
    Unreadable {
        tool: &'static str,
        path: PathBuf,
        message: String,
    },
}

/// The pipeline configuration is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid configuration for {field}: {reason}")]
pub struct ConfigurationError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigurationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigurationError {
            field,
            reason: reason.into(),
        }
    }
}

/// Classification of a partition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ToolInvocation,
    Parse,
    Configuration,
    Io,
    Other,
}

impl FailureKind {
    /// Find the first typed error in the chain of `err`.
    pub fn of(err: &anyhow::Error) -> FailureKind {
        for cause in err.chain() {
            if cause.is::<ToolInvocationError>() {
                return FailureKind::ToolInvocation;
            } else if cause.is::<ParseError>() {
                return FailureKind::Parse;
            } else if cause.is::<ConfigurationError>() {
                return FailureKind::Configuration;
            } else if cause.is::<std::io::Error>() {
                return FailureKind::Io;
            }
        }
        FailureKind::Other
    }

    /// Configuration errors fail identically on every attempt.
    pub fn is_retryable(self) -> bool {
        self != FailureKind::Configuration
    }
}
