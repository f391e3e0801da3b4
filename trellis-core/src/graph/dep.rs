//! Subscriber sets.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::reactive::{ComputationId, Subscriber};

/// The subscribers of a single (record, key) pair.
///
/// Iteration follows insertion order, and a computation is stored at most
/// once no matter how many times it reads the key.
#[derive(Default, Clone)]
pub struct Dep {
    subscribers: IndexMap<ComputationId, Arc<dyn Subscriber>>,
}

impl Dep {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Returns `false` if it was already present.
    pub fn insert(&mut self, subscriber: Arc<dyn Subscriber>) -> bool {
        let id = subscriber.id();
        if self.subscribers.contains_key(&id) {
            return false;
        }
        self.subscribers.insert(id, subscriber);
        true
    }

    /// Check if a computation is subscribed.
    pub fn contains(&self, id: ComputationId) -> bool {
        self.subscribers.contains_key(&id)
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Subscriber ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ComputationId> + '_ {
        self.subscribers.keys().copied()
    }

    /// Split into (plain, derived), each in insertion order.
    pub fn partition(&self) -> (Vec<Arc<dyn Subscriber>>, Vec<Arc<dyn Subscriber>>) {
        self.subscribers
            .values()
            .cloned()
            .partition(|subscriber| !subscriber.is_derived())
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.subscribers.keys()).finish()
    }
}
