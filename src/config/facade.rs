//! Configuration loader: assembles the layered sources into a [`TreemeldConfig`].

use super::defaults::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::TreemeldConfig;
use crate::error::ApiError;
use config::File;
use std::path::Path;
use tracing::debug;

/// Loads configuration from defaults, files and environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (highest last): defaults, global file, workspace
    /// `config/config.toml`, `config/{TREEMELD_ENV}.toml`, environment.
    pub fn load(workspace_root: &Path) -> Result<TreemeldConfig, ApiError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: TreemeldConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            policy = ?config.merge,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from one explicit file, still honoring environment overrides.
    pub fn load_from_file(path: &Path) -> Result<TreemeldConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let builder = builder_with_defaults()?.add_source(File::from(path));
        let builder = environment::add_to_builder(builder);

        let config: TreemeldConfig = builder.build()?.try_deserialize()?;
        debug!(config_path = %path.display(), policy = ?config.merge, "Configuration loaded");
        Ok(config)
    }
}
