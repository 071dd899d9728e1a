//! Configuration System
//!
//! Layered configuration for merge callers: defaults, global file, workspace files,
//! then environment overrides. Holds the merge policy callers use when they do not
//! build one in code, plus logging settings.

use crate::error::MergeError;
use crate::logging::LoggingConfig;
use crate::policy::{
    ListStrategy, NonePolicy, PolicyConfig, TypeMismatchPolicy, DEFAULT_MAX_DEPTH,
};
use serde::{Deserialize, Serialize};
use std::fmt;

mod defaults;
mod facade;
mod sources;

pub use facade::ConfigLoader;
pub use sources::environment::ENV_PREFIX;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreemeldConfig {
    /// Merge policy settings
    #[serde(default)]
    pub merge: PolicySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Merge policy as written in configuration.
///
/// `max_depth` is signed so that a negative value is reported as an invalid
/// policy rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySettings {
    #[serde(default = "default_list_strategy")]
    pub list_strategy: ListStrategy,

    #[serde(default = "default_none_policy")]
    pub none_policy: NonePolicy,

    #[serde(default = "default_type_mismatch_policy")]
    pub type_mismatch_policy: TypeMismatchPolicy,

    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
}

fn default_list_strategy() -> ListStrategy {
    PolicyConfig::DEFAULT.list_strategy
}

fn default_none_policy() -> NonePolicy {
    PolicyConfig::DEFAULT.none_policy
}

fn default_type_mismatch_policy() -> TypeMismatchPolicy {
    PolicyConfig::DEFAULT.type_mismatch_policy
}

fn default_max_depth() -> i64 {
    DEFAULT_MAX_DEPTH as i64
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self::from(PolicyConfig::DEFAULT)
    }
}

impl From<PolicyConfig> for PolicySettings {
    fn from(policy: PolicyConfig) -> Self {
        Self {
            list_strategy: policy.list_strategy,
            none_policy: policy.none_policy,
            type_mismatch_policy: policy.type_mismatch_policy,
            max_depth: i64::try_from(policy.max_depth).unwrap_or(i64::MAX),
        }
    }
}

impl PolicySettings {
    /// Build the engine policy; non-positive depths are `InvalidPolicyConfig`.
    pub fn to_policy(&self) -> Result<PolicyConfig, MergeError> {
        let max_depth = usize::try_from(self.max_depth)
            .ok()
            .filter(|depth| *depth > 0)
            .ok_or_else(|| {
                MergeError::invalid_policy(format!(
                    "max_depth must be a positive integer, got {}",
                    self.max_depth
                ))
            })?;

        let policy = PolicyConfig::new(
            self.list_strategy,
            self.none_policy,
            self.type_mismatch_policy,
            max_depth,
        );
        policy.validate()?;
        Ok(policy)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Merge(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Merge(msg) => write!(f, "Merge: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TreemeldConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.merge.to_policy() {
            errors.push(ValidationError::Merge(e.message));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The configured merge policy.
    pub fn policy(&self) -> Result<PolicyConfig, MergeError> {
        self.merge.to_policy()
    }
}
