//! Observable Values
//!
//! This module defines the plain state that the reactive layer observes:
//! keys, scalar values, and [`Record`]s, the shared keyed structures that
//! can be wrapped with [`reactive`](crate::reactive::reactive).
//!
//! # Shapes
//!
//! A record is either object-shaped or map-shaped. Object-shaped records
//! behave like script objects: every key is a property name, so integer
//! keys are coerced to their decimal string form. Map-shaped records keep
//! keys exactly as given, which means `Key::Int(1)` and `Key::from("1")`
//! are different entries.
//!
//! # Identity
//!
//! Records are reference types. Cloning a `Record` clones the handle, not
//! the entries, and two records are equal only if they are the same
//! structure. Scalars compare by value.

mod json;
mod record;

pub use record::{Record, Shape, TargetId};

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::ValueError;

/// A property key on an observed record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A named property.
    Str(Arc<str>),
    /// An integer key (map-shaped records only; coerced to `Str` on objects).
    Int(i64),
}

impl Key {
    /// Property-key coercion used by object-shaped records.
    pub(crate) fn into_property(self) -> Key {
        match self {
            Key::Int(i) => Key::Str(Arc::from(i.to_string())),
            named => named,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Arc::from(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(Arc::from(s))
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Str(s) => serializer.serialize_str(s),
            Key::Int(i) => serializer.serialize_i64(*i),
        }
    }
}

/// A value stored in an observed record.
///
/// `Record` values are what the reactive wrapper treats as nested keyed
/// structures; everything else is returned to readers unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent or explicitly empty. Reading a missing key yields `Null`.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// A nested keyed structure, compared by identity.
    Record(Record),
}

impl Value {
    /// Short name of the variant, used in error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Record(r) => write!(f, "<{} {}>", r.shape(), r.id()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Record(r) => r.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<Value> for bool {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_bool().ok_or_else(|| value.mismatch("bool"))
    }
}

impl TryFrom<Value> for i64 {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_i64().ok_or_else(|| value.mismatch("int"))
    }
}

impl TryFrom<Value> for f64 {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_f64().ok_or_else(|| value.mismatch("float"))
    }
}

impl TryFrom<Value> for String {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(other.mismatch("string")),
        }
    }
}

impl TryFrom<Value> for Record {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Record(r) => Ok(r),
            other => Err(other.mismatch("record")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_keys_coerce_to_property_names() {
        assert_eq!(Key::from(3).into_property(), Key::from("3"));
        assert_eq!(Key::from("x").into_property(), Key::from("x"));
    }

    #[test]
    fn try_from_reports_mismatch() {
        let err = i64::try_from(Value::from("ten")).unwrap_err();
        assert_eq!(
            err,
            ValueError::TypeMismatch {
                expected: "int",
                found: "string"
            }
        );
        assert_eq!(i64::try_from(Value::from(10)), Ok(10));
    }

    #[test]
    fn ints_widen_to_floats() {
        assert_eq!(Value::from(2).as_f64(), Some(2.0));
        assert_eq!(Value::from(2.5).as_i64(), None);
    }

    #[test]
    fn records_compare_by_identity() {
        let a = Record::object();
        let b = Record::object();
        assert_eq!(Value::from(a.clone()), Value::from(a));
        assert_ne!(Value::from(Record::object()), Value::from(b));
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(1)), Value::Int(1));
    }
}
