//! Reactive Runtime
//!
//! The runtime connects observed records to the computations that read
//! them. It owns the process-wide [`DependencyGraph`] and implements the two
//! halves of the protocol:
//!
//! 1. [`track`]: a read on an observed record, made while a computation is
//!    running, adds that computation to the record key's subscriber set.
//!
//! 2. [`trigger`]: a write looks up that set and re-runs every subscriber
//!    synchronously, plain computations first and derived ones second.
//!    Derived computations may read state that plain effects write, so the
//!    plain partition settles before any derived value is recomputed.
//!
//! # Thread Safety
//!
//! The execution stack is thread-local; the graph is global behind a
//! mutex. The mutex is released before any subscriber runs, so subscribers
//! are free to read and write observed state themselves.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::context::ExecutionContext;
use super::observed::Change;
use super::subscriber::{ComputationId, Subscriber};
use crate::graph::{DepKey, DependencyGraph};
use crate::value::{Key, TargetId};

static GRAPH: OnceLock<Mutex<DependencyGraph>> = OnceLock::new();

fn graph() -> &'static Mutex<DependencyGraph> {
    GRAPH.get_or_init(|| Mutex::new(DependencyGraph::new()))
}

/// Register the running computation, if any, as a subscriber of `(target, key)`.
pub fn track(target: TargetId, key: &Key) {
    let Some(current) = ExecutionContext::current() else {
        return;
    };

    let added = graph().lock().subscribe(target, key, Arc::clone(&current));
    if added {
        let dep = DepKey::new(target, key.clone());
        trace!(computation = ?current.id(), %dep, "tracked");
        current.link(dep);
    }
}

/// Drop every subscriber set held for `target`.
///
/// Called when the last handle to a record goes away.
pub(crate) fn forget(target: TargetId) {
    let Some(graph) = GRAPH.get() else {
        return;
    };
    // The removed sets may own the last handles to other records, whose own
    // drop re-enters here; release the lock first.
    let removed = graph.lock().remove_target(target);
    if let Some(keys) = removed {
        trace!(%target, keys = keys.len(), "forgot target");
    }
}

/// Run every subscriber of `(target, key)` after a write.
///
/// Untracked targets and untracked keys are no-ops.
pub fn trigger(target: TargetId, key: &Key, change: &Change) {
    let (plain, derived) = {
        let graph = graph().lock();
        match graph.dep(target, key) {
            Some(dep) => dep.partition(),
            None => return,
        }
    };

    debug!(
        %target,
        %key,
        old = %change.old_value,
        new = %change.new_value,
        plain = plain.len(),
        derived = derived.len(),
        "trigger"
    );

    for subscriber in plain {
        subscriber.notify();
    }
    for subscriber in derived {
        subscriber.notify();
    }
}

/// Read-only view of the runtime state.
pub struct Runtime;

impl Runtime {
    /// Check if a computation is running on this thread.
    pub fn is_tracking() -> bool {
        ExecutionContext::is_active()
    }

    /// The computation reads are currently attributed to.
    pub fn current_computation() -> Option<ComputationId> {
        ExecutionContext::current_id()
    }

    /// Number of subscribers registered for `(target, key)`.
    pub fn subscriber_count(target: TargetId, key: &Key) -> usize {
        graph().lock().subscriber_count(target, key)
    }

    /// Subscriber ids for `(target, key)` in insertion order.
    pub fn subscribers(target: TargetId, key: &Key) -> Vec<ComputationId> {
        graph()
            .lock()
            .dep(target, key)
            .map(|dep| dep.ids().collect())
            .unwrap_or_default()
    }

    /// Whether anything was ever tracked on `target`.
    pub fn is_observed(target: TargetId) -> bool {
        graph().lock().contains_target(target)
    }
}
