//! Randomized tree generation
//!
//! Builds the same random hierarchy of directories, files and symlinks below
//! the plain root and the secure root.

pub mod builder;
pub mod names;
pub mod registry;

pub use builder::{BuildState, TreeBuilder};
pub use names::LinkMode;
pub use registry::LinkRegistry;
