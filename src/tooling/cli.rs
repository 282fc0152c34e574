//! CLI Tooling
//!
//! Command-line interface for a stress run. Flags are folded over the merged
//! configuration before validation, so a flag always wins over the file and
//! the environment.

use crate::config::{parse_size, ByteSize, ConfigLoader, StressConfig};
use crate::error::StressError;
use crate::orchestrator::{Orchestrator, Progress, RunReport};
use crate::shell::ShellChannel;
use clap::{Parser, ValueEnum};
use rand::Rng;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Final report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// efs-stress - differential stress test for encrypted storage containers
#[derive(Parser, Debug)]
#[command(name = "efs-stress")]
#[command(about = "Build matching random trees in a plain and an encrypted directory on a device and compare their listings")]
pub struct Cli {
    /// Deepest directory level that may still contain subdirectories
    #[arg(long, value_name = "N")]
    pub max_level: Option<usize>,

    /// Maximum number of entries created per directory level
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Maximum number of symlinks in the whole run
    #[arg(long, value_name = "N")]
    pub max_links: Option<usize>,

    /// Maximum file size, e.g. 500, 10B, 2K, 2KB, 1M, 50MB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<ByteSize>,

    /// Minimum number of regular files to create
    #[arg(long, value_name = "N")]
    pub min_files: Option<usize>,

    /// Seed for tree generation; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// adb device serial
    #[arg(long)]
    pub serial: Option<String>,

    /// Configuration file path (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long, default_value = "false")]
    pub print_config: bool,

    /// Print a final run report in the given format
    #[arg(long, value_enum)]
    pub report: Option<ReportFormat>,

    /// Disable colored progress markers
    #[arg(long, default_value = "false")]
    pub no_color: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold the flags that were given over `config`.
    pub fn apply(&self, config: &mut StressConfig) {
        let bounds = &mut config.bounds;
        if let Some(v) = self.max_level {
            bounds.max_level = v;
        }
        if let Some(v) = self.max_files {
            bounds.max_files = v;
        }
        if let Some(v) = self.max_links {
            bounds.max_links = v;
        }
        if let Some(v) = self.max_size {
            bounds.max_size = v;
        }
        if let Some(v) = self.min_files {
            bounds.min_files = v;
        }
        if let Some(ref serial) = self.serial {
            config.device.serial = Some(serial.clone());
        }

        let logging = &mut config.logging;
        if let Some(ref level) = self.log_level {
            logging.level = level.clone();
        }
        if let Some(ref format) = self.log_format {
            logging.format = format.clone();
        }
        if let Some(ref output) = self.log_output {
            logging.output = output.clone();
        }
        if let Some(ref file) = self.log_file {
            logging.file = Some(file.clone());
        }
        if self.no_color {
            logging.color = false;
        }
    }
}

/// Resolved configuration and seed for one invocation.
pub struct CliContext {
    config: StressConfig,
    seed: u64,
}

impl CliContext {
    /// Load the configuration layers, apply the flags and validate.
    pub fn new(cli: &Cli) -> Result<Self, StressError> {
        let config = ConfigLoader::load_with(cli.config.as_deref(), |config| cli.apply(config))?;
        let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
        Ok(Self { config, seed })
    }

    pub fn from_parts(config: StressConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    pub fn config(&self) -> &StressConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Effective configuration as TOML.
    pub fn render_config(&self) -> Result<String, StressError> {
        toml::to_string_pretty(&self.config)
            .map_err(|e| StressError::ConfigError(format!("Failed to render configuration: {}", e)))
    }

    /// Run every stage against `shell`, writing progress lines to `out`.
    pub fn execute<S, W>(&self, shell: &mut S, out: W, color: bool) -> Result<RunReport, StressError>
    where
        S: ShellChannel + ?Sized,
        W: Write,
    {
        info!(seed = self.seed, "seed for this run");
        let progress = Progress::new(out, color && self.config.logging.color);
        Orchestrator::new(shell, &self.config, progress, self.seed).run()
    }

    pub fn render_report(report: &RunReport, format: ReportFormat) -> Result<String, StressError> {
        match format {
            ReportFormat::Text => Ok(report.to_text()),
            ReportFormat::Json => report
                .to_json()
                .map_err(|e| StressError::InvalidArgument(format!("Failed to render report: {}", e))),
        }
    }
}
