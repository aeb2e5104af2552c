//! # Error Types
//!
//! Every failure the deployment engine can report, grouped by where it originates.
//! The driver decides what a given error means for the tool being processed:
//! a `PrivilegeMismatch` stops the whole invocation, an error out of `acquire`
//! aborts the tool, anything else is reported and the lifecycle continues.

use std::path::PathBuf;
use thiserror::Error;

use crate::schemas::deployment::PrivilegeRequirement;

/// A version string that is not a dotted sequence of integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("version string is empty")]
    Empty,

    /// Contains the full input and the offending component.
    #[error("malformed version '{version}': component '{component}' is not an integer")]
    MalformedVersion { version: String, component: String },
}

/// Failure to run an external program at all.
///
/// A program that ran and exited non-zero is not a `CommandError`; callers get a
/// `CommandOutput` and decide for themselves whether the exit status matters.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The executable does not exist in PATH (or at the given path).
    #[error("command '{0}' not found")]
    NotFound(String),

    /// Any other spawn or wait failure (permissions, broken pipe, ...).
    #[error("failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while deploying or removing a single tool.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The specialization needs a privilege level the process does not have.
    /// This is the only fatal class: the invocation stops before any work is done.
    #[error("'{tool}' {required}, refusing to touch the system")]
    PrivilegeMismatch {
        tool: String,
        required: PrivilegeRequirement,
    },

    /// Download or clone failed; the rest of the tool's lifecycle is skipped.
    #[error("failed to acquire '{tool}': {reason}")]
    Acquisition { tool: String, reason: String },

    #[error(transparent)]
    Command(#[from] CommandError),

    /// An external program ran but reported failure.
    #[error("'{program}' exited with status {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: i32,
        stderr: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor lacks a field this specialization relies on.
    #[error("'{tool}' is missing '{field}' in its catalog entry")]
    MissingField { tool: String, field: &'static str },
}

impl DeployError {
    /// Wraps an `io::Error` together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeployError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must stop the whole catalog run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeployError::PrivilegeMismatch { .. })
    }
}
