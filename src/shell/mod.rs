//! Remote shell channel
//!
//! Every interaction with the device goes through [`ShellChannel`]: one
//! blocking command at a time, with stdout, stderr and exit status captured.
//! Commands are argument vectors; quoting happens only at the transport
//! boundary.

pub mod adb;
pub mod memory;

pub use adb::AdbChannel;
pub use memory::{Fault, MemoryShell};

use crate::error::{ExitInfo, StressError, StressResult};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

/// A program and its arguments, executed on the remote target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    program: String,
    args: Vec<String>,
}

impl RemoteCommand {
    pub fn new(program: impl Into<String>) -> Self {
        RemoteCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Render as a single command line for a POSIX shell, quoting each word.
    pub fn to_shell_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| shell_escape::unix::escape(Cow::Borrowed(word.as_str())).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_line())
    }
}

/// Captured result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitInfo,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Capability to run commands on the remote target.
pub trait ShellChannel {
    /// Run a command and capture its output. An unsuccessful exit status is
    /// not an error here; only a failure to reach the target is.
    fn execute(&mut self, command: &RemoteCommand) -> StressResult<CommandOutput>;

    /// Run a command and turn a non-zero exit status into
    /// [`StressError::RemoteCommandFailed`].
    fn run(&mut self, command: &RemoteCommand) -> StressResult<CommandOutput> {
        debug!(command = %command, "remote exec");
        let output = self.execute(command)?;
        if !output.success() {
            return Err(StressError::RemoteCommandFailed {
                command: command.to_string(),
                status: output.status,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    /// Whether `path` exists on the target (`test -e`).
    fn exists(&mut self, path: &str) -> StressResult<bool> {
        let output = self.execute(&RemoteCommand::new("test").arg("-e").arg(path))?;
        match output.status {
            ExitInfo::Code(0) => Ok(true),
            ExitInfo::Code(1) => Ok(false),
            status => Err(StressError::RemoteCommandFailed {
                command: format!("test -e {}", path),
                status,
                stderr: output.stderr,
            }),
        }
    }
}
