//! Records: shared keyed structures.
//!
//! A record is the plain state a caller hands to the reactive layer. The
//! runtime never owns it; wrappers and the dependency graph refer to it by
//! handle and by [`TargetId`] respectively.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::{Key, Value};
use crate::reactive;

/// Process-unique identity of a record.
///
/// The dependency graph is keyed by this id, never by record contents, so
/// two records holding equal entries are tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Container shape of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Property bag; keys are coerced to strings.
    Object,
    /// Keyed collection; keys are kept as given.
    Map,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Object => f.write_str("object"),
            Shape::Map => f.write_str("map"),
        }
    }
}

struct RecordInner {
    id: TargetId,
    shape: Shape,
    entries: RwLock<IndexMap<Key, Value>>,
}

impl Drop for RecordInner {
    fn drop(&mut self) {
        // No handle can reach this id again, so its subscriber sets are dead.
        reactive::forget(self.id);
    }
}

/// A shared, mutable keyed structure.
///
/// All accessors on `Record` are raw: they neither track reads nor notify
/// subscribers. Go through a [`Reactive`](crate::reactive::Reactive) wrapper
/// for observed access.
///
/// # Example
///
/// ```rust
/// use trellis_core::value::{Record, Value};
///
/// let point = Record::object_from([("x", 1), ("y", 2)]);
/// assert_eq!(point.get("x"), Value::Int(1));
/// assert_eq!(point.get("z"), Value::Null);
/// ```
#[derive(Clone)]
pub struct Record {
    inner: Arc<RecordInner>,
}

impl Record {
    /// Create an empty record of the given shape.
    pub fn new(shape: Shape) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                id: TargetId::next(),
                shape,
                entries: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Create an empty object-shaped record.
    pub fn object() -> Self {
        Self::new(Shape::Object)
    }

    /// Create an empty map-shaped record.
    pub fn map() -> Self {
        Self::new(Shape::Map)
    }

    /// Build an object-shaped record from key/value pairs.
    pub fn object_from<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        Self::with_entries(Shape::Object, entries)
    }

    /// Build a map-shaped record from key/value pairs.
    pub fn map_from<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        Self::with_entries(Shape::Map, entries)
    }

    fn with_entries<I, K, V>(shape: Shape, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        let record = Self::new(shape);
        {
            let mut map = record.inner.entries.write();
            for (k, v) in entries {
                map.insert(record.normalize(k.into()), v.into());
            }
        }
        record
    }

    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    pub fn shape(&self) -> Shape {
        self.inner.shape
    }

    /// Apply the shape's key rules.
    pub(crate) fn normalize(&self, key: Key) -> Key {
        match self.inner.shape {
            Shape::Object => key.into_property(),
            Shape::Map => key,
        }
    }

    /// Read an entry. Missing keys read as [`Value::Null`].
    pub fn get(&self, key: impl Into<Key>) -> Value {
        let key = self.normalize(key.into());
        self.inner
            .entries
            .read()
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// Write an entry, returning the previous value if there was one.
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        let key = self.normalize(key.into());
        self.inner.entries.write().insert(key, value.into())
    }

    /// Remove an entry, preserving the order of the remaining ones.
    pub fn remove(&self, key: impl Into<Key>) -> Option<Value> {
        let key = self.normalize(key.into());
        self.inner.entries.write().shift_remove(&key)
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        let key = self.normalize(key.into());
        self.inner.entries.read().contains_key(&key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Whether both handles refer to the same structure.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Entries are left out: records may contain themselves.
        f.debug_struct("Record")
            .field("id", &self.inner.id)
            .field("shape", &self.inner.shape)
            .field("len", &self.len())
            .finish()
    }
}

/// Serializes the current entries as a map.
///
/// Nested records are serialized recursively, so a record that contains
/// itself cannot be serialized.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.inner.entries.read();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (k, v) in entries.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ids_are_unique() {
        let a = Record::object();
        let b = Record::object();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn object_keys_are_coerced() {
        let obj = Record::object();
        obj.insert(1, "one");
        assert_eq!(obj.get("1"), Value::from("one"));
        assert_eq!(obj.get(1), Value::from("one"));
        assert_eq!(obj.keys(), vec![Key::from("1")]);
    }

    #[test]
    fn map_keys_are_kept_as_given() {
        let map = Record::map();
        map.insert(1, "int");
        map.insert("1", "str");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(1), Value::from("int"));
        assert_eq!(map.get("1"), Value::from("str"));
    }

    #[test]
    fn insert_returns_previous_value() {
        let obj = Record::object_from([("a", 1)]);
        assert_eq!(obj.insert("a", 2), Some(Value::Int(1)));
        assert_eq!(obj.insert("b", 3), None);
        assert_eq!(obj.remove("a"), Some(Value::Int(2)));
        assert!(!obj.contains_key("a"));
        assert_eq!(obj.len(), 1);
    }

    #[test]
    fn clones_share_entries() {
        let a = Record::object();
        let b = a.clone();
        b.insert("k", true);
        assert_eq!(a.get("k"), Value::Bool(true));
        assert_eq!(a, b);
    }
}
