//! Value Model
//!
//! The mergeable node representation: a closed set of shapes (null, scalar, sequence,
//! mapping, structured record). Every tree handed to the engine is built from these.

use crate::path::{Path, PathSegment};
use std::collections::HashMap;
use std::fmt;

mod convert;

pub use convert::ConvertError;

/// Primitive leaf value
///
/// Integers above `i64::MAX` are held as `Unsigned`; both variants share
/// [`ScalarKind::Integer`], so magnitude never changes how a value merges.
/// Conversions keep the form canonical: `Unsigned` only ever holds values that
/// do not fit in `i64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
}

/// Primitive kind of a [`Scalar`]. Scalars of different kinds never merge silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Integer,
    Float,
    String,
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Integer(_) | Scalar::Unsigned(_) => ScalarKind::Integer,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::String(_) => ScalarKind::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            Scalar::Unsigned(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Any integer, signed or unsigned, widened losslessly.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Scalar::Integer(i) => Some(i128::from(*i)),
            Scalar::Unsigned(u) => Some(i128::from(*u)),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Unsigned(u) => write!(f, "{}", u),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Ordered key/value entries with unique keys.
///
/// Iteration follows insertion order. Inserting an existing key replaces its
/// value without moving it. Lookups go through a key index, so merging two
/// mappings is linear in their sizes. Equality is order-sensitive.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or replace; returns the previous value for the key, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, value)),
            None => {
                self.push_unique(key, value);
                None
            }
        }
    }

    /// Append an entry whose key the caller knows is not yet present.
    pub(crate) fn push_unique(&mut self, key: String, value: Value) {
        let position = self.entries.len();
        let previous = self.index.insert(key.clone(), position);
        debug_assert!(previous.is_none(), "duplicate mapping key {key:?}");
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let position = self.index.remove(key)?;
        let (_, value) = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Schema-typed node: named fields plus the identity of the schema they conform to
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: String,
    fields: Mapping,
}

impl Record {
    pub fn new(schema: impl Into<String>, fields: Mapping) -> Self {
        Self {
            schema: schema.into(),
            fields,
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn fields(&self) -> &Mapping {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn into_fields(self) -> Mapping {
        self.fields
    }
}

/// A mergeable tree node
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent or explicit null
    #[default]
    Null,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    Record(Record),
}

/// Shape of a node, used in diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Scalar(ScalarKind),
    Sequence,
    Mapping,
    Record(String),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Null => f.write_str("null"),
            ValueKind::Scalar(kind) => write!(f, "{}", kind),
            ValueKind::Sequence => f.write_str("sequence"),
            ValueKind::Mapping => f.write_str("mapping"),
            ValueKind::Record(schema) => write!(f, "record '{}'", schema),
        }
    }
}

impl Value {
    /// Build a mapping from `(key, value)` pairs; later duplicates replace earlier ones.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Mapping(entries.into_iter().collect())
    }

    pub fn sequence<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn record<K, V, I>(schema: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Record(Record::new(schema, fields.into_iter().collect()))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Scalar(scalar) => ValueKind::Scalar(scalar.kind()),
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Mapping(_) => ValueKind::Mapping,
            Value::Record(record) => ValueKind::Record(record.schema.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Child by key (mappings and records) or `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(mapping) => mapping.get(key),
            Value::Record(record) => record.get(key),
            _ => None,
        }
    }

    /// Node at `path`, if every segment resolves.
    pub fn lookup(&self, path: &Path) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match segment {
                PathSegment::Key(key) => node.get(key),
                PathSegment::Index(index) => node.as_sequence().and_then(|s| s.get(*index)),
            })
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<Mapping> for Value {
    fn from(mapping: Mapping) -> Self {
        Value::Mapping(mapping)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Scalar::$variant(v $(as $cast)?)
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Scalar(Scalar::from(v))
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    i64 => Integer,
    i32 => Integer as i64,
    u32 => Integer as i64,
    f64 => Float,
    String => String,
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Scalar::Integer(i),
            Err(_) => Scalar::Unsigned(v),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Scalar(Scalar::from(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Scalar(Scalar::from(v))
    }
}
