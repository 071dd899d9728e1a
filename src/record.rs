//! Structured Records
//!
//! Schemas for [`Record`] values and the record merge entry point. A record merge
//! runs the structural engine first; only a structurally successful result is
//! re-validated against the schema of every registered record it contains.

use crate::engine::{MergeEngine, MergeResult};
use crate::error::{MergeError, MergeErrors};
use crate::path::Path;
use crate::policy::PolicyConfig;
use crate::value::{Record, Scalar, ScalarKind, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Shape a field value must have
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedKind {
    Bool,
    Integer,
    Float,
    /// Integer or float
    Number,
    String,
    Sequence,
    Mapping,
    Record(String),
}

impl ExpectedKind {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ExpectedKind::Bool, Value::Scalar(s)) => s.kind() == ScalarKind::Bool,
            (ExpectedKind::Integer, Value::Scalar(s)) => s.kind() == ScalarKind::Integer,
            (ExpectedKind::Float, Value::Scalar(s)) => s.kind() == ScalarKind::Float,
            (ExpectedKind::Number, Value::Scalar(s)) => {
                matches!(s.kind(), ScalarKind::Integer | ScalarKind::Float)
            }
            (ExpectedKind::String, Value::Scalar(s)) => s.kind() == ScalarKind::String,
            (ExpectedKind::Sequence, Value::Sequence(_)) => true,
            (ExpectedKind::Mapping, Value::Mapping(_)) => true,
            (ExpectedKind::Record(schema), Value::Record(record)) => record.schema() == schema,
            _ => false,
        }
    }
}

impl fmt::Display for ExpectedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedKind::Bool => f.write_str("bool"),
            ExpectedKind::Integer => f.write_str("integer"),
            ExpectedKind::Float => f.write_str("float"),
            ExpectedKind::Number => f.write_str("number"),
            ExpectedKind::String => f.write_str("string"),
            ExpectedKind::Sequence => f.write_str("sequence"),
            ExpectedKind::Mapping => f.write_str("mapping"),
            ExpectedKind::Record(schema) => write!(f, "record '{}'", schema),
        }
    }
}

/// Field-level rule checked after a merge
#[derive(Debug, Clone, PartialEq)]
pub enum FieldConstraint {
    Kind(ExpectedKind),
    /// String, sequence, mapping or record with at least one element
    NonEmpty,
    IntegerRange { min: Option<i64>, max: Option<i64> },
    OneOf(Vec<Scalar>),
    /// Upper bound on string characters or sequence/mapping entries
    MaxLength(usize),
}

impl FieldConstraint {
    /// `None` when satisfied, otherwise the violation message.
    fn check(&self, value: &Value) -> Option<String> {
        match self {
            FieldConstraint::Kind(expected) => (!expected.matches(value))
                .then(|| format!("expected {}, found {}", expected, value.kind())),
            FieldConstraint::NonEmpty => match length_of(value) {
                Some(0) => Some("must not be empty".to_string()),
                Some(_) => None,
                None => Some(format!("emptiness is undefined for {}", value.kind())),
            },
            FieldConstraint::IntegerRange { min, max } => {
                let Some(n) = value.as_scalar().and_then(Scalar::as_i128) else {
                    return Some(format!("expected integer, found {}", value.kind()));
                };
                match (min, max) {
                    (Some(min), _) if n < i128::from(*min) => {
                        Some(format!("{} is below minimum {}", n, min))
                    }
                    (_, Some(max)) if n > i128::from(*max) => {
                        Some(format!("{} is above maximum {}", n, max))
                    }
                    _ => None,
                }
            }
            FieldConstraint::OneOf(allowed) => {
                let found = value.as_scalar().is_some_and(|s| allowed.contains(s));
                (!found).then(|| {
                    let options: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                    format!("must be one of [{}]", options.join(", "))
                })
            }
            FieldConstraint::MaxLength(limit) => match length_of(value) {
                Some(len) if len > *limit => {
                    Some(format!("length {} exceeds maximum {}", len, limit))
                }
                Some(_) => None,
                None => Some(format!("length is undefined for {}", value.kind())),
            },
        }
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::Scalar(Scalar::String(s)) => Some(s.chars().count()),
        Value::Sequence(items) => Some(items.len()),
        Value::Mapping(mapping) => Some(mapping.len()),
        Value::Record(record) => Some(record.fields().len()),
        _ => None,
    }
}

/// A named field with its constraints
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub name: String,
    pub required: bool,
    pub constraints: Vec<FieldConstraint>,
}

impl FieldRule {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            constraints: Vec::new(),
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            constraints: Vec::new(),
        }
    }

    pub fn with(mut self, constraint: FieldConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Validation rules for records of one schema identity
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldRule>,
    allow_unknown_fields: bool,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            allow_unknown_fields: false,
        }
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    pub fn allow_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Every violation of this schema by `record`, located under `at`.
    ///
    /// A null field counts as absent: it fails `required` and skips constraints.
    pub fn validate(&self, record: &Record, at: &Path) -> Vec<MergeError> {
        let mut errors = Vec::new();

        for rule in &self.fields {
            let field_path = at.key(rule.name.as_str());
            match record.get(&rule.name).filter(|v| !v.is_null()) {
                None if rule.required => errors.push(MergeError::validation(
                    field_path,
                    format!("missing required field '{}' of '{}'", rule.name, self.name),
                )),
                None => {}
                Some(value) => errors.extend(
                    rule.constraints
                        .iter()
                        .filter_map(|c| c.check(value))
                        .map(|message| MergeError::validation(field_path.clone(), message)),
                ),
            }
        }

        if !self.allow_unknown_fields {
            for key in record.fields().keys() {
                if !self.fields.iter().any(|rule| rule.name == key) {
                    errors.push(MergeError::validation(
                        at.key(key),
                        format!("unknown field '{}' for '{}'", key, self.name),
                    ));
                }
            }
        }

        errors
    }
}

/// Schema lookup by record identity
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, RecordSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, returning the one it replaces.
    pub fn register(&mut self, schema: RecordSchema) -> Option<RecordSchema> {
        self.schemas.insert(schema.name.clone(), schema)
    }

    pub fn with(mut self, schema: RecordSchema) -> Self {
        self.register(schema);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RecordSchema> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Validate every registered record in `value`. Records of unregistered
    /// schemas are walked into but not checked themselves.
    pub fn validate_tree(&self, value: &Value, at: &Path) -> Vec<MergeError> {
        let mut errors = Vec::new();
        self.walk(value, at, &mut errors);
        errors
    }

    /// Validate `record` against its own schema and every registered record nested in it.
    pub fn validate_record(&self, record: &Record, at: &Path) -> Vec<MergeError> {
        let mut errors = Vec::new();
        self.walk_record(record, at, &mut errors);
        errors
    }

    fn walk(&self, value: &Value, at: &Path, errors: &mut Vec<MergeError>) {
        match value {
            Value::Record(record) => self.walk_record(record, at, errors),
            Value::Mapping(mapping) => {
                for (key, entry) in mapping.iter() {
                    self.walk(entry, &at.key(key.as_str()), errors);
                }
            }
            Value::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.walk(item, &at.index(index), errors);
                }
            }
            Value::Null | Value::Scalar(_) => {}
        }
    }

    fn walk_record(&self, record: &Record, at: &Path, errors: &mut Vec<MergeError>) {
        if let Some(schema) = self.get(record.schema()) {
            errors.extend(schema.validate(record, at));
        }
        for (key, field) in record.fields().iter() {
            self.walk(field, &at.key(key.as_str()), errors);
        }
    }
}

/// Merge two records of the same schema and re-validate the result.
///
/// Fails with `DifferentRecordType` before any validation when the schemas
/// differ, and with `PostMergeValidationError` when the merged record (or any
/// registered record nested in it) breaks its schema. The top-level schema must
/// be registered.
pub fn merge_models(
    left: &Record,
    right: &Record,
    registry: &SchemaRegistry,
    policy: &PolicyConfig,
) -> MergeResult<Record> {
    let merged = MergeEngine::new(policy)?.merge_records(left, right)?;

    if !registry.contains(merged.schema()) {
        return Err(MergeErrors::single(MergeError::validation(
            Path::root(),
            format!("no schema registered for record '{}'", merged.schema()),
        )));
    }

    let errors = registry.validate_record(&merged, &Path::root());
    match MergeErrors::from_vec(errors) {
        Some(errors) => {
            debug!(
                schema = merged.schema(),
                error_count = errors.len(),
                "merged record failed schema validation"
            );
            Err(errors)
        }
        None => Ok(merged),
    }
}
