//! The transport-agnostic scalar value exchanged with the remote service.
//!
//! [`DomainValue`] is a closed tagged union. Query rows, insert payloads, and
//! the free-form extra keys of configuration payloads are all expressed in it.
//!
//! The JSON transports carry a [`DomainValue`] as its natural JSON value, so
//! the conversions to and from [`serde_json::Value`] live here. The protobuf
//! transport needs an explicit discriminated encoding and carries its own
//! codec.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// A single scalar cell or configuration value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DomainValue {
    /// Absence of a value.
    #[default]
    Null,
    Bool(bool),
    /// 64-bit signed integer. Integral input is never widened to a float.
    Integer(i64),
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Raw byte sequence.
    Bytes(Vec<u8>),
}

/// One result row (or insert payload): column name to value.
pub type Row = BTreeMap<String, DomainValue>;

/// A loosely-shaped configuration document, key to value.
pub type ConfigMap = BTreeMap<String, DomainValue>;

impl DomainValue {
    /// Returns `true` for [`DomainValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the variant name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// Renders the value as flat text.
///
/// Used wherever a transport only accepts string values. Strings are written
/// verbatim (no quotes), bytes as comma-separated decimal octets.
impl std::fmt::Display for DomainValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(bytes) => {
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{byte}")?;
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON conversions
// ---------------------------------------------------------------------------

/// Total conversion from loosely-typed JSON.
///
/// Integral numbers that fit in an `i64` become [`DomainValue::Integer`]; any
/// other number becomes [`DomainValue::Float`]. Arrays and objects have no
/// scalar counterpart and fall back to a string holding their JSON text.
impl From<Value> for DomainValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            Value::String(s) => Self::String(s),
            other @ (Value::Array(_) | Value::Object(_)) => Self::String(other.to_string()),
        }
    }
}

/// The JSON object form of a row or configuration document.
pub fn json_object(map: &BTreeMap<String, DomainValue>) -> Value {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), Value::from(value)))
            .collect(),
    )
}

/// JSON cannot represent non-finite floats; they become `null`.
impl From<&DomainValue> for Value {
    fn from(value: &DomainValue) -> Self {
        match value {
            DomainValue::Null => Value::Null,
            DomainValue::Bool(b) => Value::Bool(*b),
            DomainValue::Integer(i) => Value::Number((*i).into()),
            DomainValue::Float(x) => Number::from_f64(*x).map_or(Value::Null, Value::Number),
            DomainValue::String(s) => Value::String(s.clone()),
            DomainValue::Bytes(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
        }
    }
}

impl Serialize for DomainValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            Self::Float(_) => serializer.serialize_unit(),
            Self::String(s) => serializer.serialize_str(s),
            Self::Bytes(bytes) => serializer.collect_seq(bytes),
        }
    }
}

impl<'de> Deserialize<'de> for DomainValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

// ---------------------------------------------------------------------------
// Ergonomic constructors
// ---------------------------------------------------------------------------

impl From<bool> for DomainValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DomainValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for DomainValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for DomainValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DomainValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DomainValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for DomainValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl<T: Into<DomainValue>> From<Option<T>> for DomainValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
