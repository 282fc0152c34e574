//! `EFS_STRESS__<SECTION>__<KEY>` environment overlay.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

const PREFIX: &str = "EFS_STRESS";
const SEPARATOR: &str = "__";

fn overlay() -> Environment {
    Environment::with_prefix(PREFIX)
        .prefix_separator(SEPARATOR)
        .separator(SEPARATOR)
        .try_parsing(true)
}

/// Add the environment overlay to builder.
/// `EFS_STRESS__BOUNDS__MAX_LEVEL=3` sets `bounds.max_level`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(overlay()))
}
