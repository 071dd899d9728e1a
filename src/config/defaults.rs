//! Layer defaults: the values every configuration starts from before files and
//! environment are applied.

use crate::policy::PolicyConfig;
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the default merge policy and logging settings.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let policy = PolicyConfig::DEFAULT;
    Config::builder()
        .set_default("merge.list_strategy", policy.list_strategy.as_str())?
        .set_default("merge.none_policy", policy.none_policy.as_str())?
        .set_default(
            "merge.type_mismatch_policy",
            policy.type_mismatch_policy.as_str(),
        )?
        .set_default("merge.max_depth", policy.max_depth as i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")
}
