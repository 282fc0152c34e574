//! Link target registry.
//!
//! Entries are appended until capacity and never removed; symlinks consume
//! them in insertion order by index.

use crate::types::PathPair;

/// Ordered, bounded list of paths eligible as symlink targets.
#[derive(Debug, Clone)]
pub struct LinkRegistry {
    entries: Vec<PathPair>,
    capacity: usize,
}

impl LinkRegistry {
    pub fn new(capacity: usize) -> Self {
        LinkRegistry {
            entries: Vec::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append `pair` if there is room. Returns whether it was stored.
    pub fn try_register(&mut self, pair: PathPair) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(pair);
        true
    }

    pub fn get(&self, index: usize) -> Option<&PathPair> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn entries(&self) -> &[PathPair] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
