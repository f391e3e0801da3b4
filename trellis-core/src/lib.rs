//! Trellis Core
//!
//! This crate provides the core runtime for Trellis, a fine-grained
//! reactivity engine. It implements:
//!
//! - Observed records with tracked reads and notifying writes
//! - A per-property dependency graph
//! - Effects and computed values with ordered, synchronous notification
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: plain keyed state (records, keys, values) and its JSON bridge
//! - `graph`: the `(record, key) -> subscribers` mapping
//! - `reactive`: the execution stack, track/trigger, effects, computed
//!   values and the observed-record wrapper
//! - `error`: conversion errors for the value layer
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use trellis_core::reactive::{computed, effect, reactive};
//! use trellis_core::value::Record;
//!
//! // Wrap some state
//! let state = reactive(Record::object_from([("count", 1)]));
//!
//! // Create a derived value
//! let s = state.clone();
//! let doubled = computed(move || s.get("count").as_i64().unwrap_or(0) * 2);
//!
//! // Create an effect
//! let seen = Arc::new(AtomicI64::new(0));
//! let (s, out) = (state.clone(), seen.clone());
//! effect(move || out.store(s.get("count").as_i64().unwrap_or(0), Ordering::SeqCst));
//!
//! // Update the state; the effect has re-run by the time `set` returns
//! state.set("count", 5);
//! assert_eq!(seen.load(Ordering::SeqCst), 5);
//! assert_eq!(doubled.value(), Some(10));
//! ```

pub mod error;
pub mod graph;
pub mod reactive;
pub mod value;

pub use error::ValueError;
