//! CLI route: single route table and run context.

use crate::api::merge_configs;
use crate::cli::parse::{Commands, OutputFormat, PolicyArgs};
use crate::config::{ConfigLoader, TreemeldConfig};
use crate::error::{ApiError, MergeErrors};
use crate::policy::PolicyConfig;
use crate::value::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime context for CLI execution: the loaded configuration.
pub struct RunContext {
    config: TreemeldConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: TreemeldConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TreemeldConfig {
        &self.config
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Merge {
                left,
                right,
                policy,
                output,
            } => self.handle_merge(left, right, policy, *output),
            Commands::Policy { policy } => Ok(self.effective_policy(policy)?.to_string()),
        }
    }

    /// Configured policy with command-line overrides applied.
    pub fn effective_policy(&self, args: &PolicyArgs) -> Result<PolicyConfig, ApiError> {
        let mut settings = self.config.merge.clone();
        if let Some(ref s) = args.list_strategy {
            settings.list_strategy = s.parse().map_err(invalid_policy)?;
        }
        if let Some(ref s) = args.none_policy {
            settings.none_policy = s.parse().map_err(invalid_policy)?;
        }
        if let Some(ref s) = args.on_mismatch {
            settings.type_mismatch_policy = s.parse().map_err(invalid_policy)?;
        }
        if let Some(depth) = args.max_depth {
            settings.max_depth = depth;
        }
        settings
            .to_policy()
            .map_err(|e| ApiError::Merge(MergeErrors::single(e)))
    }

    fn handle_merge(
        &self,
        left: &Path,
        right: &Path,
        args: &PolicyArgs,
        output: OutputFormat,
    ) -> Result<String, ApiError> {
        let policy = self.effective_policy(args)?;
        let left_tree = load_document(left)?;
        let right_tree = load_document(right)?;
        debug!(left = %left.display(), right = %right.display(), %policy, "Merging documents");

        let merged = merge_configs(&left_tree, &right_tree, &policy)?;
        info!("Merge completed");
        render(&merged, output)
    }
}

fn invalid_policy(e: crate::policy::ParsePolicyError) -> ApiError {
    ApiError::Merge(MergeErrors::single(crate::error::MergeError::invalid_policy(
        e.to_string(),
    )))
}

/// Read a JSON or TOML document, chosen by file extension (JSON otherwise).
pub fn load_document(path: &Path) -> Result<Value, ApiError> {
    let text = std::fs::read_to_string(path)?;
    let invalid = |message: String| ApiError::InvalidDocument {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            let doc: toml::Value = toml::from_str(&text).map_err(|e| invalid(e.to_string()))?;
            Ok(Value::from_toml(&doc))
        }
        _ => {
            let doc: serde_json::Value =
                serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
            Ok(Value::from_json(&doc))
        }
    }
}

fn render(value: &Value, output: OutputFormat) -> Result<String, ApiError> {
    match output {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| ApiError::Render(e.to_string()))
        }
        OutputFormat::Toml => {
            let toml::Value::Table(table) = value.to_toml()? else {
                return Err(ApiError::Render(format!(
                    "TOML output needs a mapping at the root, found {}",
                    value.kind()
                )));
            };
            toml::to_string_pretty(&table).map_err(|e| ApiError::Render(e.to_string()))
        }
    }
}
