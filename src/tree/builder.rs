//! Randomized tree builder.
//!
//! Every entry is created twice, once below each side of a [`PathPair`], so
//! the plain and secure trees share names, depths, sizes, permissions and link
//! targets. Names are drawn once, checked against the plain root only, and
//! reused for the secure root.

use super::names::{random_name, random_permissions, random_size, LinkMode};
use super::registry::LinkRegistry;
use crate::config::BuildBounds;
use crate::error::{StressError, StressResult};
use crate::shell::{RemoteCommand, ShellChannel};
use crate::types::{PathPair, RunCounters};
use rand::Rng;
use tracing::{debug, info};

/// Block size used for the bulk of a generated file.
const WRITE_BLOCK: u64 = 1024;

/// Redraws allowed before giving up on finding an unused name.
const MAX_NAME_ATTEMPTS: usize = 4096;

/// Mutable state of one build pass.
#[derive(Debug, Clone)]
pub struct BuildState {
    pub counters: RunCounters,
    pub registry: LinkRegistry,
}

impl BuildState {
    pub fn new(bounds: &BuildBounds) -> Self {
        BuildState {
            counters: RunCounters::default(),
            registry: LinkRegistry::new(bounds.max_links),
        }
    }

    pub fn reset(&mut self) {
        self.counters.reset();
        self.registry.clear();
    }
}

/// Populates both trees through a shell channel.
pub struct TreeBuilder<'a, S: ShellChannel + ?Sized, R: Rng> {
    shell: &'a mut S,
    rng: R,
    bounds: BuildBounds,
}

impl<'a, S: ShellChannel + ?Sized, R: Rng> TreeBuilder<'a, S, R> {
    pub fn new(shell: &'a mut S, rng: R, bounds: BuildBounds) -> Self {
        TreeBuilder { shell, rng, bounds }
    }

    /// Invoke [`TreeBuilder::populate`] at depth 0 until the file counter
    /// reaches `min_files`. Returns the number of top-level invocations.
    pub fn build(&mut self, root: &PathPair, state: &mut BuildState) -> StressResult<usize> {
        let mut invocations = 0;
        while state.counters.files < self.bounds.min_files {
            self.populate(root, 0, state)?;
            invocations += 1;
        }
        info!(
            files = state.counters.files,
            directories = state.counters.directories,
            links = state.counters.links,
            registered = state.registry.len(),
            invocations,
            "tree built"
        );
        Ok(invocations)
    }

    /// Create one randomized level below `root`, recursing into new
    /// directories while `depth < max_level`.
    pub fn populate(
        &mut self,
        root: &PathPair,
        depth: usize,
        state: &mut BuildState,
    ) -> StressResult<()> {
        let entries = self.rng.random_range(1..self.bounds.max_files.max(2));
        debug!(root = %root.plain, depth, entries, "populating level");

        for _ in 0..entries {
            let wants_dir = self.rng.random_range(0..2u8) == 1;
            let link_mode = LinkMode::draw(&mut self.rng);

            if wants_dir && depth < self.bounds.max_level {
                let dir = self.make_dir(root)?;
                state.counters.directories += 1;
                self.populate(&dir, depth + 1, state)?;
                if link_mode != LinkMode::Plain {
                    state.registry.try_register(dir);
                }
            } else if let Some(target) = self.next_link_target(link_mode, state) {
                self.make_link(root, &target)?;
                state.counters.links += 1;
            } else {
                let file = self.make_file(root)?;
                state.counters.files += 1;
                if link_mode == LinkMode::Reusable {
                    state.registry.try_register(file);
                }
            }
        }
        Ok(())
    }

    /// The registry entry the next symlink consumes, if a link is wanted and
    /// both the budget and the registry allow one.
    fn next_link_target(&self, link_mode: LinkMode, state: &BuildState) -> Option<PathPair> {
        if link_mode != LinkMode::Link || state.counters.links >= self.bounds.max_links {
            return None;
        }
        state.registry.get(state.counters.links).cloned()
    }

    fn unused_name(&mut self, root: &PathPair) -> StressResult<PathPair> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = root.join(&random_name(&mut self.rng));
            if !self.shell.exists(&candidate.plain)? {
                return Ok(candidate);
            }
        }
        Err(StressError::NamesExhausted(root.plain.clone()))
    }

    fn make_dir(&mut self, root: &PathPair) -> StressResult<PathPair> {
        let dir = self.unused_name(root)?;
        self.shell.run(&RemoteCommand::new("mkdir").arg(&dir.plain))?;
        self.shell.run(&RemoteCommand::new("mkdir").arg(&dir.secure))?;
        debug!(path = %dir.plain, "directory created");
        Ok(dir)
    }

    fn make_file(&mut self, root: &PathPair) -> StressResult<PathPair> {
        let file = self.unused_name(root)?;
        let size = random_size(&mut self.rng, self.bounds.max_size.bytes());
        let perms = random_permissions(&mut self.rng);

        self.write_random(&file.plain, size)?;
        self.shell
            .run(&RemoteCommand::new("chmod").arg(perms.octal()).arg(&file.plain))?;
        self.shell.run(
            &RemoteCommand::new("cp")
                .arg("-p")
                .arg(&file.plain)
                .arg(&file.secure),
        )?;
        debug!(path = %file.plain, size, mode = %perms.octal(), "file created");
        Ok(file)
    }

    /// Fill `path` with exactly `size` random bytes: whole blocks first, then
    /// the remainder byte-wise at the right offset.
    fn write_random(&mut self, path: &str, size: u64) -> StressResult<()> {
        let blocks = size / WRITE_BLOCK;
        let rest = size % WRITE_BLOCK;
        let dd = || {
            RemoteCommand::new("dd")
                .arg("if=/dev/urandom")
                .arg(format!("of={}", path))
        };

        if blocks > 0 {
            self.shell.run(
                &dd()
                    .arg(format!("bs={}", WRITE_BLOCK))
                    .arg(format!("count={}", blocks)),
            )?;
        }
        if rest > 0 {
            self.shell.run(
                &dd()
                    .arg("bs=1")
                    .arg(format!("count={}", rest))
                    .arg(format!("seek={}", blocks * WRITE_BLOCK))
                    .arg("conv=notrunc"),
            )?;
        }
        Ok(())
    }

    fn make_link(&mut self, root: &PathPair, target: &PathPair) -> StressResult<PathPair> {
        let link = self.unused_name(root)?;
        self.shell.run(
            &RemoteCommand::new("ln")
                .arg("-s")
                .arg(&target.plain)
                .arg(&link.plain),
        )?;
        self.shell.run(
            &RemoteCommand::new("ln")
                .arg("-s")
                .arg(&target.secure)
                .arg(&link.secure),
        )?;
        debug!(path = %link.plain, target = %target.plain, "symlink created");
        Ok(link)
    }
}
