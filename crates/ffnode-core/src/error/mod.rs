//! Domain errors raised by the media pipeline.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint and keep the error `Clone`
//! friendly for the continue-on-failure path.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Filesystem action that failed on a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Creating or writing a staged file.
    Write,
    /// Reading the tool's output file back.
    Read,
    /// Removing a staged file during cleanup.
    Remove,
}

impl FileAction {
    /// Returns the verb used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Read => "read",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an external tool invocation did not succeed.
#[derive(Debug, Clone, Error)]
pub enum ToolFailure {
    /// The process could not be started.
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] Arc<std::io::Error>),
    /// Waiting on the running process failed.
    #[error("failed to wait for process: {0}")]
    Wait(#[source] Arc<std::io::Error>),
    /// The process exited with a non-zero status code.
    #[error("process exited with status {0}")]
    ExitStatus(i32),
    /// The process was terminated by a signal and has no exit code.
    #[error("process was terminated by a signal")]
    Signalled,
    /// The process exceeded the configured timeout and was killed.
    #[error("process timed out after {0}s")]
    TimedOut(u64),
}

/// Errors arising while running a media operation.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The external tool failed; carries the full command for reproduction.
    #[error("external tool failed: {reason}. Command: {command}")]
    ExternalTool {
        /// Fully rendered command line.
        command: String,
        /// Underlying failure.
        #[source]
        reason: ToolFailure,
    },

    /// A staged file could not be written, read, or removed.
    #[error("failed to {action} staged file {}: {source}", .path.display())]
    Filesystem {
        /// Action that failed.
        action: FileAction,
        /// File the action targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A binary payload was not valid base64.
    #[error("binary payload of item {item} is not valid base64: {source}")]
    InvalidPayload {
        /// Position of the offending item.
        item: usize,
        /// Underlying decode error.
        #[source]
        source: base64::DecodeError,
    },

    /// Merge found fewer usable inputs than the configured minimum.
    #[error("merge requires at least {required} input files but only {available} were provided")]
    InsufficientInputs {
        /// Configured minimum number of files.
        required: usize,
        /// Number of items carrying binary data.
        available: usize,
    },

    /// The probe tool produced output that is not the expected JSON.
    #[error("probe output could not be parsed: {source}. Command: {command}")]
    ProbeOutput {
        /// Fully rendered probe command line.
        command: String,
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl PipelineError {
    /// Builds a filesystem error from an I/O failure.
    pub(crate) fn filesystem(
        action: FileAction,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Returns the rendered command attached to the error, if any.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::ExternalTool { command, .. } | Self::ProbeOutput { command, .. } => {
                Some(command.as_str())
            }
            _ => None,
        }
    }
}
