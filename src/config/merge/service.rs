//! MergeService: orchestrates sources and deserializes to StressConfig.

use crate::config::sources::{environment, file};
use crate::config::StressConfig;
use config::ConfigError;
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: serde defaults (lowest) -> config file -> environment (highest).
    pub fn load(config_file: Option<&Path>) -> Result<StressConfig, ConfigError> {
        let builder = config::Config::builder();
        let builder = match config_file {
            Some(path) => file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ByteSize;
    use std::io::Write;

    #[test]
    fn test_load_without_sources_yields_defaults() {
        let config = MergeService::load(None).unwrap();
        assert_eq!(config.bounds, crate::config::BuildBounds::default());
        assert_eq!(config.roots, crate::config::RootsConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[bounds]\nmax_level = 2\nmax_size = \"2K\"\n\n[device]\nserial = \"emulator-5554\"\n"
        )
        .unwrap();

        let config = MergeService::load(Some(file.path())).unwrap();
        assert_eq!(config.bounds.max_level, 2);
        assert_eq!(config.bounds.max_size, ByteSize(2048));
        assert_eq!(config.bounds.max_files, 10);
        assert_eq!(config.device.serial.as_deref(), Some("emulator-5554"));
        assert_eq!(config.device.adb, "adb");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(MergeService::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_malformed_size_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[bounds]\nmax_size = \"lots\"").unwrap();
        assert!(MergeService::load(Some(file.path())).is_err());
    }
}
