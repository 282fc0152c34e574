//! Random draws used by the tree builder.

use crate::types::Permissions;
use rand::Rng;

/// Largest name value plus one: names are six hex digits.
const NAME_SPACE: u32 = 1 << 24;

/// A random six-digit lowercase hex name.
pub fn random_name<R: Rng>(rng: &mut R) -> String {
    format!("{:06x}", rng.random_range(0..NAME_SPACE))
}

/// Owner rwx, group and other uniform over 0-7.
pub fn random_permissions<R: Rng>(rng: &mut R) -> Permissions {
    Permissions::new(rng.random_range(0..8), rng.random_range(0..8))
}

/// A file size in `[1, max_size)`, or 1 when that range is empty.
pub fn random_size<R: Rng>(rng: &mut R, max_size: u64) -> u64 {
    if max_size <= 1 {
        1
    } else {
        rng.random_range(1..max_size)
    }
}

/// What an entry may do with the link registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Neither registered nor a link.
    Plain,
    /// Registered as a future symlink target.
    Reusable,
    /// Becomes a symlink when a target is available.
    Link,
}

impl LinkMode {
    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        match rng.random_range(0..3u8) {
            0 => LinkMode::Plain,
            1 => LinkMode::Reusable,
            _ => LinkMode::Link,
        }
    }
}
