//! Configuration
//!
//! Layered with the `config` crate: serde defaults, an optional TOML file,
//! `EFS_STRESS__*` environment variables, then command-line flags applied by
//! the CLI on top of the merged result.

pub mod facade;
pub mod merge;
pub mod size;
pub mod sources;

pub use facade::ConfigLoader;
pub use size::{parse_size, ByteSize};

use crate::error::StressError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Complete configuration for one stress run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StressConfig {
    #[serde(default)]
    pub bounds: BuildBounds,

    #[serde(default)]
    pub roots: RootsConfig,

    #[serde(default)]
    pub container: ContainerConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Limits for tree generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildBounds {
    /// Deepest directory level that may still contain subdirectories
    #[serde(default = "default_max_level")]
    pub max_level: usize,

    /// Upper bound on entries created in one directory level
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Symlink budget for the whole run; also the link registry capacity
    #[serde(default = "default_max_links")]
    pub max_links: usize,

    /// Exclusive upper bound on generated file sizes
    #[serde(default = "default_max_size")]
    pub max_size: ByteSize,

    /// Regular files required before generation stops
    #[serde(default = "default_min_files")]
    pub min_files: usize,
}

fn default_max_level() -> usize {
    5
}

fn default_max_files() -> usize {
    10
}

fn default_max_links() -> usize {
    30
}

fn default_max_size() -> ByteSize {
    ByteSize(50 * ByteSize::MIB)
}

fn default_min_files() -> usize {
    30
}

impl Default for BuildBounds {
    fn default() -> Self {
        Self {
            max_level: default_max_level(),
            max_files: default_max_files(),
            max_links: default_max_links(),
            max_size: default_max_size(),
            min_files: default_min_files(),
        }
    }
}

/// Remote locations of the two trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootsConfig {
    #[serde(default = "default_plain_root")]
    pub plain: String,

    #[serde(default = "default_secure_root")]
    pub secure: String,
}

fn default_plain_root() -> String {
    "/data/data/testn".to_string()
}

fn default_secure_root() -> String {
    "/data/data/teste".to_string()
}

impl Default for RootsConfig {
    fn default() -> Self {
        Self {
            plain: default_plain_root(),
            secure: default_secure_root(),
        }
    }
}

/// Encrypted container management tool on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Placeholder credential used to create and unlock the container
    #[serde(default = "default_credential")]
    pub credential: String,
}

fn default_tool() -> String {
    "efs-tools".to_string()
}

fn default_credential() -> String {
    "0000".to_string()
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            credential: default_credential(),
        }
    }
}

/// How the device is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_adb")]
    pub adb: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

fn default_adb() -> String {
    "adb".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb: default_adb(),
            serial: None,
        }
    }
}

impl StressConfig {
    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), StressError> {
        let bounds = &self.bounds;
        if bounds.max_files == 0 {
            return Err(StressError::ConfigError(
                "max_files must be at least 1".to_string(),
            ));
        }
        if bounds.max_size.bytes() == 0 {
            return Err(StressError::ConfigError(
                "max_size must be at least 1 byte".to_string(),
            ));
        }
        if bounds.min_files == 0 {
            return Err(StressError::ConfigError(
                "min_files must be at least 1".to_string(),
            ));
        }

        let plain = self.roots.plain.trim_end_matches('/');
        let secure = self.roots.secure.trim_end_matches('/');
        for root in [plain, secure] {
            if !root.starts_with('/') || root.len() < 2 {
                return Err(StressError::ConfigError(format!(
                    "root '{}' must be an absolute path below /",
                    root
                )));
            }
        }
        if plain == secure
            || plain.starts_with(&format!("{}/", secure))
            || secure.starts_with(&format!("{}/", plain))
        {
            return Err(StressError::ConfigError(format!(
                "roots '{}' and '{}' must be disjoint",
                plain, secure
            )));
        }
        // `ls -l` reports a symlink's size as the length of its target, which
        // embeds the root path.
        if plain.len() != secure.len() {
            return Err(StressError::ConfigError(format!(
                "roots '{}' and '{}' must have the same length",
                plain, secure
            )));
        }

        if self.container.tool.trim().is_empty() {
            return Err(StressError::ConfigError(
                "container tool cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
