//! Observed Records
//!
//! [`Reactive`] is the interception layer: a handle over a [`Record`] whose
//! `get` and `set` feed the dependency graph.
//!
//! # Reads
//!
//! `get` reads the entry, tracks `(record, key)` against the running
//! computation, and hands back either the scalar value or, for a nested
//! record, a wrapper over that record. Reads through a nested wrapper track
//! against the nested record's own keys, so writes to `outer.inner.x` and
//! `outer.x` are independent.
//!
//! # Writes
//!
//! `set` writes through to the record first, then triggers. The record and
//! its wrappers never disagree, and every subscriber has re-run by the time
//! `set` returns.
//!
//! # Nested wrappers
//!
//! By default a wrapper caches the wrappers it creates for nested records,
//! so reading the same nested record twice yields the same handle and
//! `==` holds while that handle is alive. Cache entries are weak and never
//! keep a replaced record or its wrapper alive. [`WrapOptions::strict`]
//! turns the cache off and builds a fresh wrapper on every read.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::runtime::{self, Runtime};
use crate::value::{Key, Record, TargetId, Value};

/// Wrapper configuration, inherited by nested wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapOptions {
    /// Reuse one wrapper per nested record instead of rewrapping on each read.
    pub memoize_nested: bool,
}

impl WrapOptions {
    /// Rewrap nested records on every read.
    pub fn strict() -> Self {
        Self {
            memoize_nested: false,
        }
    }
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            memoize_nested: true,
        }
    }
}

/// Metadata describing a single write, passed to [`runtime::trigger`].
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub key: Key,
    /// `Value::Null` if the key was absent.
    pub old_value: Value,
    pub new_value: Value,
}

/// The result of reading through a wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum Read {
    Value(Value),
    Nested(Reactive),
}

impl Read {
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Read::Value(v) => Some(v),
            Read::Nested(_) => None,
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, Read::Nested(_))
    }

    pub fn into_nested(self) -> Option<Reactive> {
        match self {
            Read::Nested(r) => Some(r),
            Read::Value(_) => None,
        }
    }

    /// The underlying value; a nested wrapper yields its raw record.
    pub fn into_value(self) -> Value {
        match self {
            Read::Value(v) => v,
            Read::Nested(r) => Value::Record(r.target().clone()),
        }
    }
}

struct WrapperInner {
    target: Record,
    options: WrapOptions,
    nested: Mutex<HashMap<TargetId, Weak<WrapperInner>>>,
}

/// A tracked handle over a [`Record`].
///
/// Cloning yields the same wrapper. Two wrappers are equal only if they
/// are the same wrapper; use [`Reactive::same_target`] to compare the
/// records underneath.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use trellis_core::reactive::{effect, reactive};
/// use trellis_core::value::Record;
///
/// let state = reactive(Record::object_from([("a", 1), ("b", 2)]));
/// let seen = Arc::new(AtomicI64::new(0));
///
/// let (s, out) = (state.clone(), seen.clone());
/// effect(move || {
///     let sum = s.get("a").as_i64().unwrap_or(0) + s.get("b").as_i64().unwrap_or(0);
///     out.store(sum, Ordering::SeqCst);
/// });
/// assert_eq!(seen.load(Ordering::SeqCst), 3);
///
/// state.set("a", 10);
/// assert_eq!(seen.load(Ordering::SeqCst), 12);
/// ```
#[derive(Clone)]
pub struct Reactive {
    inner: Arc<WrapperInner>,
}

impl Reactive {
    /// Wrap `target` with default options.
    pub fn new(target: Record) -> Self {
        Self::with_options(target, WrapOptions::default())
    }

    pub fn with_options(target: Record, options: WrapOptions) -> Self {
        Self {
            inner: Arc::new(WrapperInner {
                target,
                options,
                nested: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Read `key`, tracking it against the running computation.
    ///
    /// Missing keys read as `Value::Null` and are still tracked, so a later
    /// write that creates the key re-runs the reader.
    pub fn get(&self, key: impl Into<Key>) -> Read {
        let target = &self.inner.target;
        let key = target.normalize(key.into());
        let value = target.get(key.clone());

        runtime::track(target.id(), &key);

        match value {
            Value::Record(record) => Read::Nested(self.wrap_nested(record)),
            other => Read::Value(other),
        }
    }

    /// Write `value` to `key` and synchronously re-run its subscribers.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) {
        let target = &self.inner.target;
        let key = target.normalize(key.into());
        let new_value = value.into();
        let old_value = target
            .insert(key.clone(), new_value.clone())
            .unwrap_or_default();

        let change = Change {
            key,
            old_value,
            new_value,
        };
        runtime::trigger(target.id(), &change.key, &change);
    }

    /// Compute a new value from the current one and [`set`](Self::set) it.
    ///
    /// The read of the current value is not tracked.
    pub fn update<F>(&self, key: impl Into<Key>, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let key = self.inner.target.normalize(key.into());
        let new_value = f(&self.inner.target.get(key.clone()));
        self.set(key, new_value);
    }

    /// Read `key` without tracking and without wrapping nested records.
    pub fn get_untracked(&self, key: impl Into<Key>) -> Value {
        self.inner.target.get(key)
    }

    /// The wrapped record.
    pub fn target(&self) -> &Record {
        &self.inner.target
    }

    pub fn id(&self) -> TargetId {
        self.inner.target.id()
    }

    pub fn options(&self) -> WrapOptions {
        self.inner.options
    }

    /// Whether both wrappers observe the same record.
    pub fn same_target(&self, other: &Reactive) -> bool {
        self.inner.target.ptr_eq(&other.inner.target)
    }

    /// Number of computations subscribed to `key` on the wrapped record.
    pub fn subscriber_count(&self, key: impl Into<Key>) -> usize {
        let key = self.inner.target.normalize(key.into());
        Runtime::subscriber_count(self.id(), &key)
    }

    fn wrap_nested(&self, record: Record) -> Reactive {
        let options = self.inner.options;
        if !options.memoize_nested {
            return Reactive::with_options(record, options);
        }

        let mut nested = self.inner.nested.lock();
        if let Some(inner) = nested.get(&record.id()).and_then(Weak::upgrade) {
            return Reactive { inner };
        }

        nested.retain(|_, wrapper| wrapper.strong_count() > 0);
        let wrapper = Reactive::with_options(record, options);
        nested.insert(wrapper.id(), Arc::downgrade(&wrapper.inner));
        wrapper
    }

    #[cfg(test)]
    fn cached_nested(&self) -> usize {
        self.inner.nested.lock().len()
    }
}

/// Wrap `target` for tracked access.
///
/// Every call creates a new wrapper; wrappers over the same record share
/// subscribers because the graph is keyed by the record.
pub fn reactive(target: Record) -> Reactive {
    Reactive::new(target)
}

impl From<Record> for Reactive {
    fn from(target: Record) -> Self {
        Reactive::new(target)
    }
}

impl PartialEq for Reactive {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("target", &self.inner.target)
            .field("options", &self.inner.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn reads_return_scalars_and_wrap_records() {
        let inner = Record::object_from([("x", 1)]);
        let state = reactive(Record::object_from([("n", Value::from(5)), ("inner", Value::from(inner.clone()))]));

        assert_eq!(state.get("n").as_i64(), Some(5));
        assert_eq!(state.get("missing").into_value(), Value::Null);

        let nested = state.get("inner").into_nested().unwrap();
        assert!(nested.target().ptr_eq(&inner));
        assert_eq!(nested.get("x").as_i64(), Some(1));
    }

    #[test]
    fn writes_pass_through_to_target() {
        let record = Record::object();
        let state = reactive(record.clone());

        state.set("a", 7);
        assert_eq!(record.get("a"), Value::Int(7));

        state.update("a", |v| Value::from(v.as_i64().unwrap_or(0) + 1));
        assert_eq!(record.get("a"), Value::Int(8));
    }

    #[test]
    fn nested_wrappers_are_memoized_by_default() {
        let state = reactive(Record::object_from([("inner", Record::object())]));

        let first = state.get("inner").into_nested().unwrap();
        let second = state.get("inner").into_nested().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nested_cache_does_not_retain_replaced_records() {
        let state = reactive(Record::object());

        for _ in 0..1000 {
            state.set("inner", Record::object());
            let inner = state.get("inner").into_nested().unwrap();
            assert_eq!(inner, state.get("inner").into_nested().unwrap());
        }
        assert!(state.cached_nested() <= 1);

        let held = state.get("inner").into_nested().unwrap();
        state.set("inner", Record::object());
        let fresh = state.get("inner").into_nested().unwrap();
        assert!(!held.same_target(&fresh));
        assert_eq!(state.cached_nested(), 2);

        drop(held);
        state.set("inner", Record::object());
        let _latest = state.get("inner").into_nested().unwrap();
        // The dropped wrapper is pruned; `fresh` is still alive.
        assert_eq!(state.cached_nested(), 2);
    }

    #[test]
    fn strict_options_rewrap_every_read() {
        let state = Reactive::with_options(
            Record::object_from([("inner", Record::object_from([("deep", Record::object())]))]),
            WrapOptions::strict(),
        );

        let first = state.get("inner").into_nested().unwrap();
        let second = state.get("inner").into_nested().unwrap();
        assert_ne!(first, second);
        assert!(first.same_target(&second));

        // Options are inherited by nested wrappers.
        assert_eq!(first.options(), WrapOptions::strict());
        let deep = first.get("deep").into_nested().unwrap();
        assert!(!deep.options().memoize_nested);
    }

    #[test]
    fn top_level_wrap_is_fresh_each_call() {
        let record = Record::object();
        let a = reactive(record.clone());
        let b = reactive(record);
        assert_ne!(a, b);
        assert!(a.same_target(&b));
    }

    #[test]
    fn wrappers_over_same_record_share_subscribers() {
        let record = Record::object_from([("v", 0)]);
        let reader = reactive(record.clone());
        let writer = reactive(record);
        let runs = Arc::new(AtomicI32::new(0));

        let runs_clone = runs.clone();
        let _e = effect(move || {
            reader.get("v");
            runs_clone.fetch_add(1, Ordering::SeqCst);
        });

        writer.set("v", 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(writer.subscriber_count("v"), 1);
    }

    #[test]
    fn untracked_reads_register_nothing() {
        let state = reactive(Record::object_from([("v", 0)]));
        let runs = Arc::new(AtomicI32::new(0));

        let (s, runs_clone) = (state.clone(), runs.clone());
        let _e = effect(move || {
            s.get_untracked("v");
            runs_clone.fetch_add(1, Ordering::SeqCst);
        });

        state.set("v", 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(state.subscriber_count("v"), 0);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: WrapOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, WrapOptions::default());

        let opts: WrapOptions = serde_json::from_str(r#"{"memoize_nested": false}"#).unwrap();
        assert_eq!(opts, WrapOptions::strict());
    }
}
