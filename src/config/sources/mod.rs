//! Individual configuration sources.

pub mod environment;
pub mod file;
