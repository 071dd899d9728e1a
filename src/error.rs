//! Error types for the treemeld merge engine.

use crate::path::Path;
use crate::value::{ConvertError, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a merge failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeErrorKind {
    /// Node shapes conflict and the policy says to fail
    TypeMismatch,
    /// Two records of different schemas; never resolved by policy
    DifferentRecordType,
    /// Nesting exceeded the policy's `max_depth`
    RecursionLimitExceeded,
    /// Structural merge succeeded but the result breaks its schema
    PostMergeValidationError,
    /// The policy itself is malformed
    InvalidPolicyConfig,
}

impl fmt::Display for MergeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeErrorKind::TypeMismatch => "TypeMismatch",
            MergeErrorKind::DifferentRecordType => "DifferentRecordType",
            MergeErrorKind::RecursionLimitExceeded => "RecursionLimitExceeded",
            MergeErrorKind::PostMergeValidationError => "PostMergeValidationError",
            MergeErrorKind::InvalidPolicyConfig => "InvalidPolicyConfig",
        };
        f.write_str(name)
    }
}

/// A single merge failure, located by the path of the node that produced it
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} at {path}: {message}")]
pub struct MergeError {
    pub path: Path,
    pub kind: MergeErrorKind,
    pub message: String,
}

impl MergeError {
    pub fn new(kind: MergeErrorKind, path: Path, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    pub fn type_mismatch(path: Path, left: &ValueKind, right: &ValueKind) -> Self {
        Self::new(
            MergeErrorKind::TypeMismatch,
            path,
            format!("cannot merge {} with {}", left, right),
        )
    }

    pub fn different_record_type(path: Path, left: &str, right: &str) -> Self {
        Self::new(
            MergeErrorKind::DifferentRecordType,
            path,
            format!("record '{}' cannot merge with record '{}'", left, right),
        )
    }

    pub fn recursion_limit(path: Path, max_depth: usize) -> Self {
        Self::new(
            MergeErrorKind::RecursionLimitExceeded,
            path,
            format!("nesting exceeds max_depth {}", max_depth),
        )
    }

    pub fn validation(path: Path, message: impl Into<String>) -> Self {
        Self::new(MergeErrorKind::PostMergeValidationError, path, message)
    }

    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::new(MergeErrorKind::InvalidPolicyConfig, Path::root(), message)
    }
}

/// Every failure of one merge call, in traversal order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeErrors(Vec<MergeError>);

impl MergeErrors {
    pub fn single(error: MergeError) -> Self {
        Self(vec![error])
    }

    /// `None` when `errors` is empty.
    pub fn from_vec(errors: Vec<MergeError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn errors(&self) -> &[MergeError] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergeError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> &MergeError {
        &self.0[0]
    }

    pub fn has_kind(&self, kind: MergeErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }

    pub fn into_vec(self) -> Vec<MergeError> {
        self.0
    }
}

impl From<MergeError> for MergeErrors {
    fn from(error: MergeError) -> Self {
        Self::single(error)
    }
}

impl fmt::Display for MergeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [only] => write!(f, "{}", only),
            errors => {
                write!(f, "{} merge errors", errors.len())?;
                for error in errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for MergeErrors {}

impl IntoIterator for MergeErrors {
    type Item = MergeError;
    type IntoIter = std::vec::IntoIter<MergeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MergeErrors {
    type Item = &'a MergeError;
    type IntoIter = std::slice::Iter<'a, MergeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors from the surfaces around the engine: configuration, logging, documents
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid document {path}: {message}")]
    InvalidDocument {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Cannot render merged tree: {0}")]
    Render(String),

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeErrors),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
