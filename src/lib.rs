//! efs-stress: Differential Stress Testing for Encrypted Storage
//!
//! Builds the same randomized tree of directories, files and symlinks in a
//! plain directory and inside an encrypted storage container on a remote
//! device, then compares the recursive listings of both trees. Any difference
//! beyond root path and timestamps points at a defect in the storage layer.

pub mod config;
pub mod error;
pub mod listing;
pub mod logging;
pub mod orchestrator;
pub mod shell;
pub mod tooling;
pub mod tree;
pub mod types;
