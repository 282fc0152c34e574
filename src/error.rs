//! Error types
//!
//! A single error enum covers every failure the harness can observe: bad
//! configuration, an unreachable device, and remote commands that exit
//! unsuccessfully.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type StressResult<T> = Result<T, StressError>;

/// Errors raised while preparing, building, comparing or cleaning up a run.
#[derive(Debug, Error)]
pub enum StressError {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A command-line or configuration value was malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The remote target did not answer the connectivity check.
    #[error("Device unreachable: {0}")]
    DeviceUnreachable(String),

    /// A remote command ran but reported failure.
    #[error("Remote command failed: `{command}` ({status}){}", format_stderr(.stderr))]
    RemoteCommandFailed {
        command: String,
        status: ExitInfo,
        stderr: String,
    },

    /// No unused entry name could be drawn below a directory.
    #[error("No unused name found under {0}")]
    NamesExhausted(String),

    /// Local I/O failure, usually while spawning the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exit indication of a remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ExitInfo {
    /// The command exited with the given code.
    Code(i32),
    /// The command was terminated without an exit code.
    Signaled,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        matches!(self, ExitInfo::Code(0))
    }
}

impl std::fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitInfo::Code(code) => write!(f, "exit status {}", code),
            ExitInfo::Signaled => write!(f, "terminated by signal"),
        }
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

impl From<config::ConfigError> for StressError {
    fn from(err: config::ConfigError) -> Self {
        StressError::ConfigError(err.to_string())
    }
}
