//! Merge API
//!
//! Narrow entry points over the engine. Callers wanting the default behavior
//! pass [`PolicyConfig::DEFAULT`].

use crate::engine::{MergeEngine, MergeResult};
use crate::error::{MergeError, MergeErrorKind, MergeErrors};
use crate::path::Path;
use crate::policy::{ListStrategy, PolicyConfig};
use crate::record::SchemaRegistry;
use crate::value::{Value, ValueKind};

pub use crate::engine::merge;
pub use crate::model::merge_typed;
pub use crate::record::merge_models;

/// Merge two mappings. Fails with `TypeMismatch` at the root, naming each side
/// that is not a mapping.
pub fn merge_configs(left: &Value, right: &Value, policy: &PolicyConfig) -> MergeResult {
    let engine = MergeEngine::new(policy)?;
    require_kind(left, right, ValueKind::Mapping, "mapping")?;
    engine.merge(left, right)
}

/// [`merge`], then re-validate every registered record in the result.
pub fn merge_with_schemas(
    left: &Value,
    right: &Value,
    registry: &SchemaRegistry,
    policy: &PolicyConfig,
) -> MergeResult {
    MergeEngine::new(policy)?
        .with_registry(registry)
        .merge(left, right)
}

/// [`merge_configs`], then re-validate every registered record in the result.
pub fn merge_configs_with_schemas(
    left: &Value,
    right: &Value,
    registry: &SchemaRegistry,
    policy: &PolicyConfig,
) -> MergeResult {
    let engine = MergeEngine::new(policy)?.with_registry(registry);
    require_kind(left, right, ValueKind::Mapping, "mapping")?;
    engine.merge(left, right)
}

/// Merge two sequences with `strategy`, every other setting taken from
/// [`PolicyConfig::DEFAULT`].
pub fn merge_lists(left: &Value, right: &Value, strategy: ListStrategy) -> MergeResult {
    let policy = PolicyConfig::DEFAULT.with_list_strategy(strategy);
    require_kind(left, right, ValueKind::Sequence, "sequence")?;
    MergeEngine::new(&policy)?.merge(left, right)
}

fn require_kind(
    left: &Value,
    right: &Value,
    expected: ValueKind,
    name: &str,
) -> Result<(), MergeErrors> {
    let errors: Vec<MergeError> = [("left", left), ("right", right)]
        .into_iter()
        .filter(|(_, value)| value.kind() != expected)
        .map(|(side, value)| {
            MergeError::new(
                MergeErrorKind::TypeMismatch,
                Path::root(),
                format!("{} argument must be a {}, found {}", side, name, value.kind()),
            )
        })
        .collect();

    match MergeErrors::from_vec(errors) {
        Some(errors) => Err(errors),
        None => Ok(()),
    }
}
