//! Explicit TOML config file passed with `--config`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Add a required TOML file to the builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path_str = path.to_str().ok_or_else(|| {
        ConfigError::Message(format!("config path is not valid UTF-8: {}", path.display()))
    })?;
    Ok(builder.add_source(File::new(path_str, FileFormat::Toml).required(true)))
}
