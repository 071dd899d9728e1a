//! Typed Models
//!
//! Merges plain Rust structs by lifting them into [`Record`] values through
//! `serde_json`, merging structurally, then lowering the result back into the
//! struct. Lowering is the re-validation step: a missing required field, a field
//! of the wrong type, or a failed [`MergeModel::validate`] is reported as a
//! `PostMergeValidationError`, located at the field serde was reading.

use crate::engine::MergeEngine;
use crate::error::{MergeError, MergeErrorKind, MergeErrors};
use crate::path::{Path, PathSegment};
use crate::policy::PolicyConfig;
use crate::value::{Record, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A struct that can take part in a structural merge.
///
/// `SCHEMA` is the record identity the struct is lifted under; the struct must
/// serialize to a JSON object.
pub trait MergeModel: Serialize + DeserializeOwned {
    const SCHEMA: &'static str;

    /// Field-level rules beyond what deserialization enforces.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Lift a model into a record of `T::SCHEMA`.
pub fn lift<T: MergeModel>(model: &T) -> Result<Record, MergeErrors> {
    let json = serde_json::to_value(model).map_err(|e| {
        MergeError::new(
            MergeErrorKind::TypeMismatch,
            Path::root(),
            format!("'{}' cannot be lifted: {}", T::SCHEMA, e),
        )
    })?;

    Record::from_json(T::SCHEMA, &json).ok_or_else(|| {
        MergeErrors::single(MergeError::new(
            MergeErrorKind::TypeMismatch,
            Path::root(),
            format!(
                "'{}' does not serialize to named fields (found {})",
                T::SCHEMA,
                Value::from_json(&json).kind()
            ),
        ))
    })
}

/// Lower a merged value back into `T`, running `T::validate`.
pub fn lower<T: MergeModel>(value: &Value) -> Result<T, MergeErrors> {
    let model: T = serde_path_to_error::deserialize(value.to_json()).map_err(|e| {
        MergeError::validation(
            field_path(e.path()),
            format!("'{}': {}", T::SCHEMA, e.inner()),
        )
    })?;

    model.validate().map_err(|message| {
        MergeError::validation(Path::root(), format!("'{}': {}", T::SCHEMA, message))
    })?;

    Ok(model)
}

fn field_path(path: &serde_path_to_error::Path) -> Path {
    use serde_path_to_error::Segment;

    path.iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(PathSegment::Index(*index)),
            Segment::Map { key } => Some(PathSegment::Key(key.clone())),
            Segment::Enum { variant } => Some(PathSegment::Key(variant.clone())),
            _ => None,
        })
        .collect()
}

/// Merge `right` onto `left` field by field and rebuild a validated `T`.
pub fn merge_typed<T: MergeModel>(
    left: &T,
    right: &T,
    policy: &PolicyConfig,
) -> Result<T, MergeErrors> {
    let engine = MergeEngine::new(policy)?;
    let merged = engine.merge_records(&lift(left)?, &lift(right)?)?;
    lower(&Value::Record(merged))
}
