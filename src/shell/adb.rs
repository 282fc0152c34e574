//! `adb shell` transport.
//!
//! adb flattens its trailing arguments into one string for the device shell,
//! so each word is quoted here before it leaves the host. Exit status is only
//! propagated by adb's shell protocol v2 (Android 7.0 and later).

use super::{CommandOutput, RemoteCommand, ShellChannel};
use crate::config::DeviceConfig;
use crate::error::{ExitInfo, StressError, StressResult};
use std::process::Command;

/// Shell channel backed by the `adb` host binary.
pub struct AdbChannel {
    adb: String,
    serial: Option<String>,
}

impl AdbChannel {
    pub fn new(adb: impl Into<String>, serial: Option<String>) -> Self {
        AdbChannel {
            adb: adb.into(),
            serial,
        }
    }

    pub fn from_config(device: &DeviceConfig) -> Self {
        Self::new(device.adb.clone(), device.serial.clone())
    }

    fn host_command(&self, command: &RemoteCommand) -> Command {
        let mut host = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            host.arg("-s").arg(serial);
        }
        host.arg("shell").arg(command.to_shell_line());
        host
    }
}

impl ShellChannel for AdbChannel {
    fn execute(&mut self, command: &RemoteCommand) -> StressResult<CommandOutput> {
        let output = self.host_command(command).output().map_err(|e| {
            StressError::DeviceUnreachable(format!("failed to run {}: {}", self.adb, e))
        })?;

        let status = match output.status.code() {
            Some(code) => ExitInfo::Code(code),
            None => ExitInfo::Signaled,
        };

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status,
        })
    }
}
