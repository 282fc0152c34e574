//! Core types shared by the builder, the comparator and the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The same logical entry addressed under the plain root and the secure root.
///
/// Both sides are always extended with the same component, so the relative
/// structure below each root stays identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathPair {
    pub plain: String,
    pub secure: String,
}

impl PathPair {
    pub fn new(plain: impl Into<String>, secure: impl Into<String>) -> Self {
        PathPair {
            plain: plain.into(),
            secure: secure.into(),
        }
    }

    /// Append one path component to both sides.
    pub fn join(&self, name: &str) -> PathPair {
        PathPair {
            plain: format!("{}/{}", self.plain.trim_end_matches('/'), name),
            secure: format!("{}/{}", self.secure.trim_end_matches('/'), name),
        }
    }
}

impl fmt::Display for PathPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.plain, self.secure)
    }
}

/// Permission bits for a generated file: owner is always rwx.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub group: u8,
    pub other: u8,
}

impl Permissions {
    pub const OWNER: u8 = 7;

    pub fn new(group: u8, other: u8) -> Self {
        Permissions {
            group: group & 7,
            other: other & 7,
        }
    }

    pub fn mode(&self) -> u32 {
        (u32::from(Self::OWNER) << 6) | (u32::from(self.group) << 3) | u32::from(self.other)
    }

    /// Octal form accepted by `chmod`, e.g. `0750`.
    pub fn octal(&self) -> String {
        format!("0{:o}", self.mode())
    }
}

/// Run-wide counters consulted by the build loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub files: usize,
    pub links: usize,
    pub directories: usize,
}

impl RunCounters {
    pub fn reset(&mut self) {
        *self = RunCounters::default();
    }
}
