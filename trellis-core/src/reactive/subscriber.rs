//! Subscriber types for the reactive system.
//!
//! A subscriber is any computation that can be registered against an
//! (object, key) pair and re-run when that pair is written. Effects and
//! computed values are both subscribers; the graph only sees them through
//! the type-erased [`Subscriber`] trait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::graph::DepKey;

/// Unique identifier for a computation.
///
/// Identity, not closure equality, is what the dependency graph and the
/// execution stack compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(u64);

impl ComputationId {
    /// Generate a new unique computation ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ComputationId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation as seen by the graph and the execution stack.
pub trait Subscriber: Send + Sync {
    fn id(&self) -> ComputationId;

    /// Derived subscribers run after plain ones on every trigger.
    fn is_derived(&self) -> bool;

    /// Record that this computation now belongs to the subscriber set of `dep`.
    fn link(&self, dep: DepKey);

    /// Re-run the computation, discarding its result.
    fn notify(self: Arc<Self>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computation_ids_are_unique() {
        let id1 = ComputationId::new();
        let id2 = ComputationId::new();
        let id3 = ComputationId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }
}
