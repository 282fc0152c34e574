//! Device-side setup and teardown commands: policy enforcement, root
//! directories and the encrypted container lifecycle.

use crate::config::{ContainerConfig, RootsConfig};
use crate::error::{StressError, StressResult};
use crate::shell::{RemoteCommand, ShellChannel};
use tracing::{info, warn};

/// Check the channel with a no-op command, then check that a failing
/// command is reported as failing.
///
/// Anything on stderr counts as failure: adb reports a missing device there
/// even when it exits successfully. Older adb servers without the v2 shell
/// protocol exit 0 for every remote command.
pub fn check_device<S: ShellChannel + ?Sized>(shell: &mut S) -> StressResult<()> {
    let output = shell
        .execute(&RemoteCommand::new("exit"))
        .map_err(|e| StressError::DeviceUnreachable(e.to_string()))?;
    if !output.success() {
        return Err(StressError::DeviceUnreachable(format!(
            "`exit` failed with {}: {}",
            output.status,
            output.stderr.trim()
        )));
    }
    if !output.stderr.trim().is_empty() {
        return Err(StressError::DeviceUnreachable(output.stderr.trim().to_string()));
    }

    // Builds treat `test -e` and every write as status-checked.
    let output = shell
        .execute(&RemoteCommand::new("false"))
        .map_err(|e| StressError::DeviceUnreachable(e.to_string()))?;
    if output.success() {
        return Err(StressError::DeviceUnreachable(
            "channel does not report remote exit status (`false` exited 0)".to_string(),
        ));
    }
    Ok(())
}

pub fn set_enforcing(enforcing: bool) -> RemoteCommand {
    RemoteCommand::new("setenforce").arg(if enforcing { "1" } else { "0" })
}

fn storage(container: &ContainerConfig, action: &str, path: &str) -> RemoteCommand {
    RemoteCommand::new(container.tool.clone())
        .arg("storage")
        .arg(action)
        .arg(path)
}

/// Commands that leave both roots empty with an unlocked container at the
/// secure root.
pub fn prepare_commands(roots: &RootsConfig, container: &ContainerConfig) -> Vec<RemoteCommand> {
    vec![
        set_enforcing(false),
        RemoteCommand::new("rm").args(["-rf", roots.plain.as_str()]),
        RemoteCommand::new("mkdir").arg(roots.plain.clone()),
        RemoteCommand::new("rm").args(["-rf", roots.secure.as_str()]),
        RemoteCommand::new("mkdir").arg(roots.secure.clone()),
        storage(container, "create", &roots.secure).arg(container.credential.clone()),
        storage(container, "unlock", &roots.secure).arg(container.credential.clone()),
    ]
}

/// Commands that undo [`prepare_commands`].
pub fn cleanup_commands(roots: &RootsConfig, container: &ContainerConfig) -> Vec<RemoteCommand> {
    vec![
        storage(container, "lock", &roots.secure),
        storage(container, "remove", &roots.secure),
        RemoteCommand::new("rm").args(["-rf", roots.secure.as_str()]),
        RemoteCommand::new("rm").args(["-rf", roots.plain.as_str()]),
        set_enforcing(true),
    ]
}

/// Run every command in order, stopping at the first failure.
pub fn run_all<S: ShellChannel + ?Sized>(
    shell: &mut S,
    commands: &[RemoteCommand],
) -> StressResult<()> {
    for command in commands {
        shell.run(command)?;
    }
    info!(commands = commands.len(), "device prepared");
    Ok(())
}

/// Run every command even when some fail; the first failure is returned.
pub fn run_best_effort<S: ShellChannel + ?Sized>(
    shell: &mut S,
    commands: &[RemoteCommand],
) -> StressResult<()> {
    let mut first_error = None;
    for command in commands {
        if let Err(e) = shell.run(command) {
            warn!(command = %command, error = %e, "cleanup step failed");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
