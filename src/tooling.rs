//! Tooling & Integration Layer
//!
//! The command-line surface over configuration loading and the run
//! orchestrator.

pub mod cli;

pub use cli::{Cli, CliContext, ReportFormat};
