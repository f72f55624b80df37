//! Built-in defaults, the lowest-precedence layer.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

use crate::provider::{DEFAULT_API_URL, DEFAULT_CLASSIFY_MODEL, DEFAULT_POLICY_MODEL};

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("provider.api_url", DEFAULT_API_URL)?
        .set_default("provider.classify_model", DEFAULT_CLASSIFY_MODEL)?
        .set_default("provider.policy_model", DEFAULT_POLICY_MODEL)?
        .set_default("storage.state_path", crate::config::DEFAULT_STATE_PATH)
}
