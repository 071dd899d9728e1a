//! Conversions between the value model and the JSON / TOML document models.

use super::{Mapping, Record, Scalar, Value};
use crate::path::Path;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// A tree that cannot be represented in the target document model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("null at {0} cannot be represented in TOML")]
    NullInToml(Path),

    #[error("integer {value} at {path} is out of range for TOML")]
    IntegerOutOfRange { path: Path, value: u64 },
}

impl Value {
    /// Lift a JSON document. Integers above `i64::MAX` are kept as
    /// [`Scalar::Unsigned`]; only non-integral numbers become floats.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(*b)),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Scalar(Scalar::Integer(i)),
                (None, Some(u)) => Value::Scalar(Scalar::Unsigned(u)),
                (None, None) => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::Scalar(Scalar::String(s.clone())),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut mapping = Mapping::with_capacity(map.len());
                for (key, value) in map {
                    mapping.push_unique(key.clone(), Value::from_json(value));
                }
                Value::Mapping(mapping)
            }
        }
    }

    /// Lower to JSON. Records become objects; non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            Value::Scalar(Scalar::Integer(i)) => serde_json::Value::from(*i),
            Value::Scalar(Scalar::Unsigned(u)) => serde_json::Value::from(*u),
            Value::Scalar(Scalar::Float(x)) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Mapping(mapping) => mapping_to_json(mapping),
            Value::Record(record) => mapping_to_json(record.fields()),
        }
    }

    /// Lift a TOML document. Datetimes are carried as strings.
    pub fn from_toml(toml: &toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::Scalar(Scalar::String(s.clone())),
            toml::Value::Integer(i) => Value::Scalar(Scalar::Integer(*i)),
            toml::Value::Float(x) => Value::Scalar(Scalar::Float(*x)),
            toml::Value::Boolean(b) => Value::Scalar(Scalar::Bool(*b)),
            toml::Value::Datetime(dt) => Value::Scalar(Scalar::String(dt.to_string())),
            toml::Value::Array(items) => {
                Value::Sequence(items.iter().map(Value::from_toml).collect())
            }
            toml::Value::Table(table) => {
                let mut mapping = Mapping::with_capacity(table.len());
                for (key, value) in table {
                    mapping.push_unique(key.clone(), Value::from_toml(value));
                }
                Value::Mapping(mapping)
            }
        }
    }

    /// Lower to TOML. Null table entries are dropped; a null anywhere else has no
    /// TOML form and is an error, as is an integer above `i64::MAX`.
    pub fn to_toml(&self) -> Result<toml::Value, ConvertError> {
        to_toml_at(self, &Path::root())
    }
}

fn mapping_to_json(mapping: &Mapping) -> serde_json::Value {
    let map = mapping
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

fn to_toml_at(value: &Value, path: &Path) -> Result<toml::Value, ConvertError> {
    let converted = match value {
        Value::Null => return Err(ConvertError::NullInToml(path.clone())),
        Value::Scalar(Scalar::Bool(b)) => toml::Value::Boolean(*b),
        Value::Scalar(Scalar::Integer(i)) => toml::Value::Integer(*i),
        Value::Scalar(Scalar::Unsigned(u)) => {
            return Err(ConvertError::IntegerOutOfRange {
                path: path.clone(),
                value: *u,
            })
        }
        Value::Scalar(Scalar::Float(x)) => toml::Value::Float(*x),
        Value::Scalar(Scalar::String(s)) => toml::Value::String(s.clone()),
        Value::Sequence(items) => toml::Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_toml_at(item, &path.index(i)))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(mapping) => toml::Value::Table(table_to_toml(mapping, path)?),
        Value::Record(record) => toml::Value::Table(table_to_toml(record.fields(), path)?),
    };
    Ok(converted)
}

fn table_to_toml(mapping: &Mapping, path: &Path) -> Result<toml::Table, ConvertError> {
    let mut table = toml::Table::new();
    for (key, value) in mapping.iter().filter(|(_, v)| !v.is_null()) {
        table.insert(key.clone(), to_toml_at(value, &path.key(key.as_str()))?);
    }
    Ok(table)
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Value::Scalar(Scalar::Integer(i)) => serializer.serialize_i64(*i),
            Value::Scalar(Scalar::Unsigned(u)) => serializer.serialize_u64(*u),
            Value::Scalar(Scalar::Float(x)) => serializer.serialize_f64(*x),
            Value::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Mapping(mapping) => serialize_mapping(mapping, serializer),
            Value::Record(record) => serialize_mapping(record.fields(), serializer),
        }
    }
}

fn serialize_mapping<S: Serializer>(mapping: &Mapping, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(mapping.len()))?;
    for (key, value) in mapping.iter() {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl Record {
    /// Lift a JSON object as a record of `schema`; `None` if `json` is not an object.
    pub fn from_json(schema: impl Into<String>, json: &serde_json::Value) -> Option<Record> {
        match Value::from_json(json) {
            Value::Mapping(fields) => Some(Record::new(schema, fields)),
            _ => None,
        }
    }
}
