//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::StressConfig;
use crate::error::StressError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults and environment, with an optional TOML file in between.
    /// The merged configuration is validated before it is returned.
    pub fn load(file: Option<&Path>) -> Result<StressConfig, StressError> {
        Self::load_with(file, |_| {})
    }

    /// Like [`ConfigLoader::load`], applying `overrides` after the merge and
    /// before validation. Command-line flags enter here.
    pub fn load_with<F>(file: Option<&Path>, overrides: F) -> Result<StressConfig, StressError>
    where
        F: FnOnce(&mut StressConfig),
    {
        let mut config = MergeService::load(file)?;
        overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}
