//! Reactive Primitives
//!
//! This module implements the reactive system: observed records, effects,
//! and computed values.
//!
//! # Concepts
//!
//! ## Observed records
//!
//! [`reactive`] wraps a [`Record`](crate::value::Record) in a [`Reactive`]
//! handle. Reading a key through the handle while a computation runs
//! registers that computation as a subscriber of the key; writing a key
//! re-runs its subscribers before the write returns.
//!
//! ## Effects
//!
//! An effect ([`Computation`]) is a function run under tracking. It runs
//! once at creation (unless lazy) and again on every write to state it
//! read.
//!
//! ## Computed values
//!
//! A [`Computed`] is a lazy, derived computation read through
//! [`Computed::value`]. On a write, derived subscribers run only after all
//! plain effects have run.
//!
//! # Implementation Notes
//!
//! The currently running computation is found through a thread-local
//! execution stack ([`ExecutionContext`]); the subscriber sets live in one
//! process-wide [`DependencyGraph`](crate::graph::DependencyGraph).

mod computed;
mod context;
mod effect;
mod observed;
mod runtime;
mod subscriber;

pub use computed::{computed, Computed};
pub use context::{ExecutionContext, ExecutionGuard};
pub use effect::{effect, effect_with, Computation, EffectOptions};
pub use observed::{reactive, Change, Reactive, Read, WrapOptions};
pub use runtime::{track, trigger, Runtime};
pub(crate) use runtime::forget;
pub use subscriber::{ComputationId, Subscriber};
