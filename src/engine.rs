//! Merge Engine
//!
//! Recursive structural merge of two [`Value`] trees under a [`PolicyConfig`].
//!
//! The engine never mutates its inputs: both trees are borrowed and the result is
//! freshly allocated. Container nesting is tracked with an explicit depth counter
//! passed by value, so the `max_depth` ceiling is checked deterministically and
//! every return restores the caller's depth. Errors are collected across sibling
//! branches; a call yields either a fully merged tree or every error it found.
//!
//! An engine built [`with_registry`](MergeEngine::with_registry) re-validates every
//! registered record in a structurally successful result.

use crate::error::{MergeError, MergeErrors};
use crate::path::Path;
use crate::policy::{ListStrategy, NonePolicy, PolicyConfig, TypeMismatchPolicy};
use crate::record::SchemaRegistry;
use crate::value::{Mapping, Record, Value};
use tracing::{debug, debug_span, trace};

/// Result of a merge call: the merged tree or all errors found.
pub type MergeResult<T = Value> = Result<T, MergeErrors>;

/// Merge `right` onto `left` under `policy`.
pub fn merge(left: &Value, right: &Value, policy: &PolicyConfig) -> MergeResult {
    MergeEngine::new(policy)?.merge(left, right)
}

/// A validated policy bound for one or more merge calls
#[derive(Debug, Clone, Copy)]
pub struct MergeEngine<'p> {
    policy: &'p PolicyConfig,
    registry: Option<&'p SchemaRegistry>,
}

impl<'p> MergeEngine<'p> {
    /// Fails with `InvalidPolicyConfig` if the policy is malformed.
    pub fn new(policy: &'p PolicyConfig) -> Result<Self, MergeErrors> {
        policy.validate()?;
        Ok(Self {
            policy,
            registry: None,
        })
    }

    /// Re-validate registered records in every successful result.
    pub fn with_registry(self, registry: &'p SchemaRegistry) -> Self {
        Self {
            registry: Some(registry),
            ..self
        }
    }

    pub fn policy(&self) -> &PolicyConfig {
        self.policy
    }

    pub fn merge(&self, left: &Value, right: &Value) -> MergeResult {
        let span = debug_span!("merge", policy = %self.policy);
        let _enter = span.enter();

        let mut errors = Vec::new();
        let merged = self.merge_node(left, right, &Path::root(), 1, &mut errors);
        let merged = finish(merged, errors)?;

        match self.registry {
            Some(registry) => {
                let errors = registry.validate_tree(&merged, &Path::root());
                finish(merged, errors)
            }
            None => Ok(merged),
        }
    }

    /// Merge two records at the root. Records of different schemas fail with
    /// `DifferentRecordType` whatever the policy.
    pub fn merge_records(&self, left: &Record, right: &Record) -> MergeResult<Record> {
        let span = debug_span!("merge_records", schema = left.schema(), policy = %self.policy);
        let _enter = span.enter();

        let mut errors = Vec::new();
        let merged = self.merge_record_pair(left, right, &Path::root(), 1, &mut errors);
        let merged = finish(merged, errors)?;

        match self.registry {
            Some(registry) => {
                let errors = registry.validate_record(&merged, &Path::root());
                finish(merged, errors)
            }
            None => Ok(merged),
        }
    }

    /// One node. On error the returned value is a placeholder and the error has
    /// been pushed; callers only look at `errors` to decide success.
    fn merge_node(
        &self,
        left: &Value,
        right: &Value,
        path: &Path,
        depth: usize,
        errors: &mut Vec<MergeError>,
    ) -> Value {
        match (left, right) {
            (_, Value::Null) => match self.policy.none_policy {
                NonePolicy::SkipNone => left.clone(),
                NonePolicy::AllowNone => Value::Null,
            },
            (Value::Null, _) => right.clone(),
            (Value::Mapping(l), Value::Mapping(r)) => {
                if !self.within_depth(path, depth, errors) {
                    return Value::Null;
                }
                Value::Mapping(self.merge_entries(l, r, path, depth, errors))
            }
            (Value::Record(l), Value::Record(r)) => {
                Value::Record(self.merge_record_pair(l, r, path, depth, errors))
            }
            (Value::Sequence(l), Value::Sequence(r)) => {
                if !self.within_depth(path, depth, errors) {
                    return Value::Null;
                }
                Value::Sequence(self.merge_sequences(l, r, path, depth, errors))
            }
            (Value::Scalar(l), Value::Scalar(r)) if l.kind() == r.kind() => right.clone(),
            _ => self.resolve_mismatch(left, right, path, errors),
        }
    }

    fn merge_record_pair(
        &self,
        left: &Record,
        right: &Record,
        path: &Path,
        depth: usize,
        errors: &mut Vec<MergeError>,
    ) -> Record {
        if left.schema() != right.schema() {
            errors.push(MergeError::different_record_type(
                path.clone(),
                left.schema(),
                right.schema(),
            ));
            return left.clone();
        }
        if !self.within_depth(path, depth, errors) {
            return left.clone();
        }
        let fields = self.merge_entries(left.fields(), right.fields(), path, depth, errors);
        Record::new(left.schema(), fields)
    }

    fn within_depth(&self, path: &Path, depth: usize, errors: &mut Vec<MergeError>) -> bool {
        if depth > self.policy.max_depth {
            errors.push(MergeError::recursion_limit(path.clone(), self.policy.max_depth));
            return false;
        }
        true
    }

    /// Key union: left keys in left order (shared keys merged), then right-only
    /// keys in right order.
    ///
    /// Under `SkipNone` a right-only key whose value is null is dropped, since it
    /// has nothing to override. Right-only values are otherwise copied whole:
    /// nulls nested inside them are kept, as are nulls in a copied sequence tail.
    fn merge_entries(
        &self,
        left: &Mapping,
        right: &Mapping,
        path: &Path,
        depth: usize,
        errors: &mut Vec<MergeError>,
    ) -> Mapping {
        let mut merged = Mapping::with_capacity(left.len() + right.len());

        for (key, left_value) in left.iter() {
            let value = match right.get(key) {
                Some(right_value) => self.merge_node(
                    left_value,
                    right_value,
                    &path.key(key.as_str()),
                    depth + 1,
                    errors,
                ),
                None => left_value.clone(),
            };
            merged.push_unique(key.clone(), value);
        }

        for (key, right_value) in right.iter() {
            if left.contains_key(key) {
                continue;
            }
            // A right-only null has nothing to override.
            if right_value.is_null() && self.policy.none_policy == NonePolicy::SkipNone {
                continue;
            }
            merged.push_unique(key.clone(), right_value.clone());
        }

        merged
    }

    fn merge_sequences(
        &self,
        left: &[Value],
        right: &[Value],
        path: &Path,
        depth: usize,
        errors: &mut Vec<MergeError>,
    ) -> Vec<Value> {
        match self.policy.list_strategy {
            ListStrategy::Concatenate => left.iter().chain(right).cloned().collect(),
            ListStrategy::Replace => right.to_vec(),
            ListStrategy::ElementWise => {
                let shared = left.len().min(right.len());
                let mut merged = Vec::with_capacity(left.len().max(right.len()));
                for (index, (l, r)) in left.iter().zip(right).enumerate() {
                    merged.push(self.merge_node(l, r, &path.index(index), depth + 1, errors));
                }
                let tail = if left.len() > right.len() { left } else { right };
                merged.extend(tail[shared..].iter().cloned());
                merged
            }
        }
    }

    fn resolve_mismatch(
        &self,
        left: &Value,
        right: &Value,
        path: &Path,
        errors: &mut Vec<MergeError>,
    ) -> Value {
        match self.policy.type_mismatch_policy {
            TypeMismatchPolicy::Error => {
                errors.push(MergeError::type_mismatch(
                    path.clone(),
                    &left.kind(),
                    &right.kind(),
                ));
                Value::Null
            }
            TypeMismatchPolicy::SkipOnMismatch => {
                trace!(
                    path = %path,
                    left = %left.kind(),
                    right = %right.kind(),
                    "mismatch kept left"
                );
                left.clone()
            }
            TypeMismatchPolicy::ForceOverride => {
                trace!(
                    path = %path,
                    left = %left.kind(),
                    right = %right.kind(),
                    "mismatch took right"
                );
                right.clone()
            }
        }
    }
}

fn finish<T>(merged: T, errors: Vec<MergeError>) -> MergeResult<T> {
    match MergeErrors::from_vec(errors) {
        Some(errors) => {
            debug!(error_count = errors.len(), "merge failed");
            Err(errors)
        }
        None => Ok(merged),
    }
}
