//! Environment source: `VEIL_<TABLE>__<KEY>` variables, plus the bare `VEIL_API_KEY`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

pub const API_KEY_VAR: &str = "VEIL_API_KEY";

/// Add the `VEIL_` environment layer (highest precedence).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("VEIL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );
    match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => builder.set_override("provider.api_key", key),
        _ => Ok(builder),
    }
}
