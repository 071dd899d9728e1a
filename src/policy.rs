//! Merge Policy
//!
//! Immutable description of merge behavior. A policy is a small `Copy` value; the
//! default is the named constant [`PolicyConfig::DEFAULT`], and every `with_*`
//! method returns a modified copy.

use crate::error::MergeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conservative recursion ceiling used by the default policy.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// How two sequences combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStrategy {
    /// Left elements followed by right elements
    Concatenate,
    /// Right sequence verbatim
    Replace,
    /// Pairwise merge over shared indices; the longer side's tail is copied
    ElementWise,
}

/// Whether a right-hand null overrides the left value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonePolicy {
    SkipNone,
    AllowNone,
}

/// Behavior when left and right node kinds differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeMismatchPolicy {
    Error,
    SkipOnMismatch,
    ForceOverride,
}

/// Complete merge policy; every field is explicit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub list_strategy: ListStrategy,
    pub none_policy: NonePolicy,
    pub type_mismatch_policy: TypeMismatchPolicy,
    /// Maximum nesting of merged containers; the root container is depth 1
    pub max_depth: usize,
}

impl PolicyConfig {
    pub const DEFAULT: PolicyConfig = PolicyConfig {
        list_strategy: ListStrategy::Concatenate,
        none_policy: NonePolicy::SkipNone,
        type_mismatch_policy: TypeMismatchPolicy::Error,
        max_depth: DEFAULT_MAX_DEPTH,
    };

    pub const fn new(
        list_strategy: ListStrategy,
        none_policy: NonePolicy,
        type_mismatch_policy: TypeMismatchPolicy,
        max_depth: usize,
    ) -> Self {
        Self {
            list_strategy,
            none_policy,
            type_mismatch_policy,
            max_depth,
        }
    }

    pub const fn with_list_strategy(self, list_strategy: ListStrategy) -> Self {
        Self {
            list_strategy,
            ..self
        }
    }

    pub const fn with_none_policy(self, none_policy: NonePolicy) -> Self {
        Self {
            none_policy,
            ..self
        }
    }

    pub const fn with_type_mismatch_policy(self, type_mismatch_policy: TypeMismatchPolicy) -> Self {
        Self {
            type_mismatch_policy,
            ..self
        }
    }

    pub const fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    /// Reject policies the engine cannot run under.
    pub fn validate(&self) -> Result<(), MergeError> {
        if self.max_depth == 0 {
            return Err(MergeError::invalid_policy("max_depth must be at least 1"));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "list_strategy={} none_policy={} type_mismatch_policy={} max_depth={}",
            self.list_strategy, self.none_policy, self.type_mismatch_policy, self.max_depth
        )
    }
}

/// Unrecognized policy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {setting} '{value}' (expected one of: {})", .expected.join(" "))]
pub struct ParsePolicyError {
    setting: &'static str,
    value: String,
    expected: &'static [&'static str],
}

macro_rules! policy_names {
    ($ty:ident, $setting:literal, { $($variant:ident => $name:literal),* $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),*
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParsePolicyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
                    $($name => Ok($ty::$variant),)*
                    _ => Err(ParsePolicyError {
                        setting: $setting,
                        value: s.to_string(),
                        expected: &[$($name),*],
                    }),
                }
            }
        }
    };
}

policy_names!(ListStrategy, "list strategy", {
    Concatenate => "concatenate",
    Replace => "replace",
    ElementWise => "element_wise",
});

policy_names!(NonePolicy, "none policy", {
    SkipNone => "skip_none",
    AllowNone => "allow_none",
});

policy_names!(TypeMismatchPolicy, "type mismatch policy", {
    Error => "error",
    SkipOnMismatch => "skip_on_mismatch",
    ForceOverride => "force_override",
});
