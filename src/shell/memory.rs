//! In-memory simulated device.
//!
//! Interprets the handful of POSIX commands the harness issues (`test`,
//! `mkdir`, `dd`, `chmod`, `cp -p`, `ln -s`, `ls -lR`, `rm -rf`, `setenforce`)
//! plus the container tool's `storage` subcommands against an in-memory tree.
//! Each mutating command advances a simulated clock by one minute, so the two
//! trees of a run never share timestamps. Faults can be injected to model a
//! misbehaving storage layer or an unreachable device.

use super::{CommandOutput, RemoteCommand, ShellChannel};
use crate::error::{ExitInfo, StressResult};
use std::collections::{BTreeMap, BTreeSet};

/// Misbehaviour injected into the simulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The connectivity check fails as if no device were attached.
    Offline,
    /// Every invocation of the named program exits with status 1.
    FailProgram(String),
    /// Files copied to a destination below `under` gain `extra` bytes.
    GrowCopies { under: String, extra: u64 },
}

/// Lifecycle state of a simulated storage container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File { size: u64 },
    Symlink { target: String },
}

#[derive(Debug, Clone)]
struct Entry {
    kind: EntryKind,
    mode: u32,
    minute: u32,
}

#[derive(Debug, Clone)]
struct Container {
    credential: String,
    state: ContainerState,
}

/// Simulated remote target holding a filesystem tree in memory.
#[derive(Debug, Clone)]
pub struct MemoryShell {
    entries: BTreeMap<String, Entry>,
    containers: BTreeMap<String, Container>,
    faults: Vec<Fault>,
    history: Vec<RemoteCommand>,
    enforcing: bool,
    clock: u32,
}

impl Default for MemoryShell {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryShell {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "/".to_string(),
            Entry {
                kind: EntryKind::Directory,
                mode: 0o755,
                minute: 0,
            },
        );
        MemoryShell {
            entries,
            containers: BTreeMap::new(),
            faults: Vec::new(),
            history: Vec::new(),
            enforcing: true,
            clock: 0,
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Create a directory and all missing parents.
    pub fn with_dir(mut self, path: &str) -> Self {
        let mut current = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current.push('/');
            current.push_str(component);
            self.entries.entry(current.clone()).or_insert(Entry {
                kind: EntryKind::Directory,
                mode: 0o771,
                minute: 0,
            });
        }
        self
    }

    /// Every command executed so far, in order.
    pub fn history(&self) -> &[RemoteCommand] {
        &self.history
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_enforcing(&self) -> bool {
        self.enforcing
    }

    pub fn container_state(&self, path: &str) -> Option<ContainerState> {
        self.containers.get(path).map(|c| c.state)
    }

    /// Paths below `root`, relative to it, without the leading slash.
    pub fn relative_paths(&self, root: &str) -> BTreeSet<String> {
        let prefix = format!("{}/", root.trim_end_matches('/'));
        self.entries
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }

    pub fn mode(&self, path: &str) -> Option<u32> {
        self.entries.get(path).map(|e| e.mode)
    }

    pub fn file_size(&self, path: &str) -> Option<u64> {
        match self.entries.get(path).map(|e| &e.kind) {
            Some(EntryKind::File { size }) => Some(*size),
            _ => None,
        }
    }

    pub fn symlink_target(&self, path: &str) -> Option<&str> {
        match self.entries.get(path).map(|e| &e.kind) {
            Some(EntryKind::Symlink { target }) => Some(target.as_str()),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(
            self.entries.get(path).map(|e| &e.kind),
            Some(EntryKind::Directory)
        )
    }

    fn tick(&mut self) -> u32 {
        self.clock += 1;
        self.clock
    }

    fn dispatch(&mut self, program: &str, args: &[String]) -> Outcome {
        match program {
            "exit" | "true" => Outcome::ok(),
            "false" => Outcome::fail(1, String::new()),
            "test" => self.cmd_test(args),
            "mkdir" => self.cmd_mkdir(args),
            "rm" => self.cmd_rm(args),
            "dd" => self.cmd_dd(args),
            "chmod" => self.cmd_chmod(args),
            "cp" => self.cmd_cp(args),
            "ln" => self.cmd_ln(args),
            "ls" => self.cmd_ls(args),
            "setenforce" => self.cmd_setenforce(args),
            _ if args.first().map(String::as_str) == Some("storage") => {
                self.cmd_storage(program, &args[1..])
            }
            _ => Outcome::fail(127, format!("{}: not found", program)),
        }
    }

    fn cmd_test(&self, args: &[String]) -> Outcome {
        match args {
            [flag, path] if flag == "-e" => {
                if self.entries.contains_key(path) {
                    Outcome::ok()
                } else {
                    Outcome::fail(1, String::new())
                }
            }
            _ => Outcome::fail(2, "test: unsupported expression".to_string()),
        }
    }

    fn cmd_mkdir(&mut self, args: &[String]) -> Outcome {
        let [path] = args else {
            return Outcome::fail(1, "mkdir: usage".to_string());
        };
        if let Err(message) = self.check_new_entry("mkdir", path) {
            return Outcome::fail(1, message);
        }
        let minute = self.tick();
        self.entries.insert(
            path.clone(),
            Entry {
                kind: EntryKind::Directory,
                mode: 0o755,
                minute,
            },
        );
        Outcome::ok()
    }

    fn cmd_rm(&mut self, args: &[String]) -> Outcome {
        let [flag, path] = args else {
            return Outcome::fail(1, "rm: usage".to_string());
        };
        if flag != "-rf" {
            return Outcome::fail(1, format!("rm: unsupported flag {}", flag));
        }
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.entries
            .retain(|key, _| key != path && !key.starts_with(&prefix));
        self.tick();
        Outcome::ok()
    }

    fn cmd_dd(&mut self, args: &[String]) -> Outcome {
        let mut operands = BTreeMap::new();
        for arg in args {
            match arg.split_once('=') {
                Some((key, value)) => {
                    operands.insert(key, value);
                }
                None => return Outcome::fail(1, format!("dd: bad operand {}", arg)),
            }
        }
        let number = |key: &str, default: u64| -> Option<u64> {
            match operands.get(key) {
                Some(value) => value.parse().ok(),
                None => Some(default),
            }
        };
        let (Some(bs), Some(count), Some(seek)) =
            (number("bs", 512), number("count", 0), number("seek", 0))
        else {
            return Outcome::fail(1, "dd: invalid number".to_string());
        };
        let Some(path) = operands.get("of").map(|p| p.to_string()) else {
            return Outcome::fail(1, "dd: missing of=".to_string());
        };
        let notrunc = operands.get("conv") == Some(&"notrunc");

        let written_end = seek * bs + count * bs;
        let existing = match self.entries.get(&path) {
            Some(Entry {
                kind: EntryKind::File { size },
                ..
            }) => Some(*size),
            Some(_) => return Outcome::fail(1, format!("dd: {}: not a regular file", path)),
            None => None,
        };
        if existing.is_none() {
            if let Err(message) = self.check_new_entry("dd", &path) {
                return Outcome::fail(1, message);
            }
        }
        let size = match existing {
            Some(current) if notrunc => current.max(written_end),
            _ => written_end,
        };
        let mode = self.entries.get(&path).map(|e| e.mode).unwrap_or(0o644);
        let minute = self.tick();
        self.entries.insert(
            path,
            Entry {
                kind: EntryKind::File { size },
                mode,
                minute,
            },
        );
        Outcome {
            stdout: String::new(),
            stderr: format!("{}+0 records in\n{}+0 records out\n", count, count),
            code: 0,
        }
    }

    fn cmd_chmod(&mut self, args: &[String]) -> Outcome {
        let [mode, path] = args else {
            return Outcome::fail(1, "chmod: usage".to_string());
        };
        let Ok(mode) = u32::from_str_radix(mode, 8) else {
            return Outcome::fail(1, format!("chmod: invalid mode {}", mode));
        };
        let minute = self.tick();
        match self.entries.get_mut(path) {
            Some(entry) => {
                entry.mode = mode & 0o7777;
                entry.minute = minute;
                Outcome::ok()
            }
            None => Outcome::fail(1, format!("chmod: {}: No such file or directory", path)),
        }
    }

    fn cmd_cp(&mut self, args: &[String]) -> Outcome {
        let (preserve, source, destination) = match args {
            [flag, source, destination] if flag == "-p" => (true, source, destination),
            [source, destination] => (false, source, destination),
            _ => return Outcome::fail(1, "cp: usage".to_string()),
        };
        let Some(entry) = self.entries.get(source).cloned() else {
            return Outcome::fail(1, format!("cp: {}: No such file or directory", source));
        };
        let EntryKind::File { mut size } = entry.kind else {
            return Outcome::fail(1, format!("cp: {}: not a regular file", source));
        };
        if let Err(message) = self.check_new_entry("cp", destination) {
            return Outcome::fail(1, message);
        }
        for fault in &self.faults {
            if let Fault::GrowCopies { under, extra } = fault {
                if destination.starts_with(&format!("{}/", under.trim_end_matches('/'))) {
                    size += extra;
                }
            }
        }
        let minute = self.tick();
        self.entries.insert(
            destination.clone(),
            Entry {
                kind: EntryKind::File { size },
                mode: if preserve { entry.mode } else { 0o644 },
                minute: if preserve { entry.minute } else { minute },
            },
        );
        Outcome::ok()
    }

    fn cmd_ln(&mut self, args: &[String]) -> Outcome {
        let [flag, target, link] = args else {
            return Outcome::fail(1, "ln: usage".to_string());
        };
        if flag != "-s" {
            return Outcome::fail(1, format!("ln: unsupported flag {}", flag));
        }
        if let Err(message) = self.check_new_entry("ln", link) {
            return Outcome::fail(1, message);
        }
        let minute = self.tick();
        self.entries.insert(
            link.clone(),
            Entry {
                kind: EntryKind::Symlink {
                    target: target.clone(),
                },
                mode: 0o777,
                minute,
            },
        );
        Outcome::ok()
    }

    fn cmd_ls(&self, args: &[String]) -> Outcome {
        let [flag, root] = args else {
            return Outcome::fail(1, "ls: usage".to_string());
        };
        if flag != "-lR" {
            return Outcome::fail(1, format!("ls: unsupported flag {}", flag));
        }
        if !self.is_dir(root) {
            return Outcome::fail(1, format!("ls: {}: No such file or directory", root));
        }
        let mut sections = Vec::new();
        self.list_recursive(root.trim_end_matches('/'), &mut sections);
        Outcome {
            stdout: sections.join("\n"),
            stderr: String::new(),
            code: 0,
        }
    }

    fn list_recursive(&self, dir: &str, sections: &mut Vec<String>) {
        let children = self.children(dir);
        let total: u64 = children
            .iter()
            .map(|(_, entry)| match entry.kind {
                EntryKind::File { size } => size.div_ceil(1024),
                EntryKind::Directory => 4,
                EntryKind::Symlink { .. } => 0,
            })
            .sum();

        let mut section = format!("{}:\ntotal {}\n", dir, total);
        for (name, entry) in &children {
            let path = format!("{}/{}", dir, name);
            section.push_str(&self.long_line(&path, name, entry));
            section.push('\n');
        }
        sections.push(section);

        for (name, entry) in &children {
            if entry.kind == EntryKind::Directory {
                self.list_recursive(&format!("{}/{}", dir, name), sections);
            }
        }
    }

    fn long_line(&self, path: &str, name: &str, entry: &Entry) -> String {
        let (type_char, links, size, suffix) = match &entry.kind {
            EntryKind::Directory => {
                let subdirs = self
                    .children(path)
                    .iter()
                    .filter(|(_, e)| e.kind == EntryKind::Directory)
                    .count();
                ('d', 2 + subdirs, 4096, String::new())
            }
            EntryKind::File { size } => ('-', 1, *size, String::new()),
            EntryKind::Symlink { target } => {
                ('l', 1, target.len() as u64, format!(" -> {}", target))
            }
        };
        format!(
            "{}{} {} root root {} {} {}{}",
            type_char,
            mode_string(entry.mode),
            links,
            size,
            timestamp(entry.minute),
            name,
            suffix
        )
    }

    fn children(&self, dir: &str) -> Vec<(String, Entry)> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{}/", dir)
        };
        self.entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, entry)| {
                let rest = &key[prefix.len()..];
                if rest.is_empty() || rest.contains('/') {
                    None
                } else {
                    Some((rest.to_string(), entry.clone()))
                }
            })
            .collect()
    }

    fn cmd_setenforce(&mut self, args: &[String]) -> Outcome {
        match args.first().map(String::as_str) {
            Some("0") => {
                self.enforcing = false;
                Outcome::ok()
            }
            Some("1") => {
                self.enforcing = true;
                Outcome::ok()
            }
            _ => Outcome::fail(1, "setenforce: usage".to_string()),
        }
    }

    fn cmd_storage(&mut self, program: &str, args: &[String]) -> Outcome {
        match args {
            [action, path, credential] if action == "create" => {
                if !self.is_dir(path) || self.containers.contains_key(path) {
                    return Outcome::fail(1, format!("{}: cannot create {}", program, path));
                }
                self.containers.insert(
                    path.clone(),
                    Container {
                        credential: credential.clone(),
                        state: ContainerState::Locked,
                    },
                );
                Outcome::ok()
            }
            [action, path, credential] if action == "unlock" => match self.containers.get_mut(path) {
                Some(container) if container.credential == *credential => {
                    container.state = ContainerState::Unlocked;
                    Outcome::ok()
                }
                _ => Outcome::fail(1, format!("{}: cannot unlock {}", program, path)),
            },
            [action, path] if action == "lock" => match self.containers.get_mut(path) {
                Some(container) => {
                    container.state = ContainerState::Locked;
                    Outcome::ok()
                }
                None => Outcome::fail(1, format!("{}: no container at {}", program, path)),
            },
            [action, path] if action == "remove" => match self.containers.remove(path) {
                Some(_) => Outcome::ok(),
                None => Outcome::fail(1, format!("{}: no container at {}", program, path)),
            },
            _ => Outcome::fail(1, format!("{}: unsupported storage command", program)),
        }
    }

    fn check_new_entry(&self, program: &str, path: &str) -> Result<(), String> {
        if self.entries.contains_key(path) {
            return Err(format!("{}: {}: File exists", program, path));
        }
        let parent = match path.rsplit_once('/') {
            Some(("", _)) => "/",
            Some((parent, _)) => parent,
            None => return Err(format!("{}: {}: relative path", program, path)),
        };
        if !self.is_dir(parent) {
            return Err(format!("{}: {}: No such file or directory", program, path));
        }
        Ok(())
    }
}

impl ShellChannel for MemoryShell {
    fn execute(&mut self, command: &RemoteCommand) -> StressResult<CommandOutput> {
        self.history.push(command.clone());

        let offline = self.faults.contains(&Fault::Offline);
        let failing = self
            .faults
            .iter()
            .any(|f| matches!(f, Fault::FailProgram(p) if p == command.program()));

        let outcome = if offline {
            Outcome::fail(1, "error: no devices/emulators found".to_string())
        } else if failing {
            Outcome::fail(1, format!("{}: simulated failure", command.program()))
        } else {
            self.dispatch(command.program(), command.arguments())
        };

        Ok(CommandOutput {
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            status: ExitInfo::Code(outcome.code),
        })
    }
}

struct Outcome {
    stdout: String,
    stderr: String,
    code: i32,
}

impl Outcome {
    fn ok() -> Self {
        Outcome {
            stdout: String::new(),
            stderr: String::new(),
            code: 0,
        }
    }

    fn fail(code: i32, stderr: String) -> Self {
        Outcome {
            stdout: String::new(),
            stderr,
            code,
        }
    }
}

fn mode_string(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 7;
        out.push(if bits & 4 != 0 { 'r' } else { '-' });
        out.push(if bits & 2 != 0 { 'w' } else { '-' });
        out.push(if bits & 1 != 0 { 'x' } else { '-' });
    }
    out
}

fn timestamp(minute: u32) -> String {
    let day = 1 + (minute / (24 * 60)) % 28;
    let hour = (minute / 60) % 24;
    format!("2026-10-{:02} {:02}:{:02}", day, hour, minute % 60)
}
