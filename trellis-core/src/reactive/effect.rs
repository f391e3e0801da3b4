//! Effect Implementation
//!
//! A [`Computation`] wraps a function so that every observed read it makes
//! while running is tracked, and every later write to that state runs it
//! again.
//!
//! # How Computations Work
//!
//! 1. Running a computation pushes it onto the thread's execution stack,
//!    calls the function, and pops it, even if the function panics.
//!
//! 2. Reads made during the call register the computation as a subscriber
//!    of each `(record, key)` pair read.
//!
//! 3. A write to any of those pairs re-runs the computation synchronously.
//!
//! 4. A computation already on the stack is not entered again; the nested
//!    run is skipped and yields `None`.
//!
//! # Lazy and derived
//!
//! Eager computations run once at creation to establish their initial
//! dependencies. Lazy ones wait for the first explicit [`Computation::run`].
//! Derived computations (see [`Computed`](super::Computed)) are notified
//! after all plain ones on each write.
//!
//! # Stale dependencies
//!
//! Re-running does not detach the computation from pairs it no longer
//! reads. The inverse list returned by [`Computation::dependencies`] only
//! grows.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use super::context::ExecutionContext;
use super::subscriber::{ComputationId, Subscriber};
use crate::graph::DepKey;

/// Options for [`effect_with`] and [`Computation::start`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOptions {
    /// Do not run at creation.
    pub lazy: bool,
    /// Mark as derived: notified after plain computations.
    pub computed: bool,
}

impl EffectOptions {
    /// Plain, but not run at creation.
    pub fn lazy() -> Self {
        Self {
            lazy: true,
            computed: false,
        }
    }

    /// Lazy and derived, as used by [`Computed`](super::Computed).
    pub fn computed() -> Self {
        Self {
            lazy: true,
            computed: true,
        }
    }
}

struct ComputationInner<T> {
    id: ComputationId,
    body: Box<dyn Fn() -> T + Send + Sync>,
    lazy: bool,
    derived: bool,
    deps: Mutex<SmallVec<[DepKey; 4]>>,
    run_count: AtomicUsize,
}

impl<T: 'static> ComputationInner<T> {
    fn run(self: &Arc<Self>) -> Option<T> {
        let Some(_guard) = ExecutionContext::enter(Arc::clone(self) as Arc<dyn Subscriber>) else {
            trace!(computation = ?self.id, "reentrant run skipped");
            return None;
        };
        self.run_count.fetch_add(1, Ordering::Relaxed);
        Some((self.body)())
    }
}

impl<T: 'static> Subscriber for ComputationInner<T> {
    fn id(&self) -> ComputationId {
        self.id
    }

    fn is_derived(&self) -> bool {
        self.derived
    }

    fn link(&self, dep: DepKey) {
        self.deps.lock().push(dep);
    }

    fn notify(self: Arc<Self>) {
        self.run();
    }
}

/// A re-runnable unit of work whose observed reads are tracked.
///
/// Cloning yields a handle to the same computation.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{Computation, EffectOptions};
///
/// let c = Computation::start(|| 40 + 2, EffectOptions::lazy());
/// assert_eq!(c.run_count(), 0);
/// assert_eq!(c.run(), Some(42));
/// ```
pub struct Computation<T> {
    inner: Arc<ComputationInner<T>>,
}

impl<T: 'static> Computation<T> {
    /// Create a computation without running it, regardless of `options.lazy`.
    pub fn new<F>(body: F, options: EffectOptions) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ComputationInner {
                id: ComputationId::new(),
                body: Box::new(body),
                lazy: options.lazy,
                derived: options.computed,
                deps: Mutex::new(SmallVec::new()),
                run_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Create a computation and, unless it is lazy, run it once.
    pub fn start<F>(body: F, options: EffectOptions) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let computation = Self::new(body, options);
        if !options.lazy {
            computation.run();
        }
        computation
    }

    /// Run the body with this computation on the execution stack.
    ///
    /// Returns `None` if the computation is already running on this
    /// thread. Panics in the body propagate after the stack is restored.
    pub fn run(&self) -> Option<T> {
        self.inner.run()
    }

    /// Get the computation's unique ID.
    pub fn id(&self) -> ComputationId {
        self.inner.id
    }

    /// Whether the computation skipped its run at creation.
    pub fn is_lazy(&self) -> bool {
        self.inner.lazy
    }

    /// Whether the computation is notified after plain ones.
    pub fn is_derived(&self) -> bool {
        self.inner.derived
    }

    /// Whether this computation is on the current thread's stack.
    pub fn is_running(&self) -> bool {
        ExecutionContext::contains(self.inner.id)
    }

    /// Number of times the body has been entered.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::Relaxed)
    }

    /// Every `(record, key)` pair this computation has subscribed to.
    pub fn dependencies(&self) -> Vec<DepKey> {
        self.inner.deps.lock().to_vec()
    }

    /// Get the number of dependencies.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.lock().len()
    }
}

/// Create and immediately run a plain computation.
pub fn effect<T, F>(body: F) -> Computation<T>
where
    T: 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Computation::start(body, EffectOptions::default())
}

/// Create a computation with explicit options.
pub fn effect_with<T, F>(body: F, options: EffectOptions) -> Computation<T>
where
    T: 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Computation::start(body, options)
}

impl<T> Clone for Computation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for Computation<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T: 'static> fmt::Debug for Computation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("id", &self.inner.id)
            .field("lazy", &self.inner.lazy)
            .field("derived", &self.inner.derived)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
