//! treemeld: Structural Deep Merge
//!
//! Composes layered configuration and specification trees (template inheritance,
//! context composition, parent to child overrides) under explicit merge policies.
//! Inputs are never mutated, recursion is bounded, and every failure names the
//! exact path where it happened.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod path;
pub mod policy;
pub mod record;
pub mod value;

pub use api::{
    merge, merge_configs, merge_configs_with_schemas, merge_lists, merge_models, merge_typed,
    merge_with_schemas,
};
pub use engine::{MergeEngine, MergeResult};
pub use error::{ApiError, MergeError, MergeErrorKind, MergeErrors};
pub use model::MergeModel;
pub use path::{Path, PathSegment};
pub use policy::{ListStrategy, NonePolicy, PolicyConfig, TypeMismatchPolicy};
pub use record::{ExpectedKind, FieldConstraint, FieldRule, RecordSchema, SchemaRegistry};
pub use value::{Mapping, Record, Scalar, ScalarKind, Value, ValueKind};
