//! Dependency Graph
//!
//! This module implements the subscriber graph that links observed state
//! to the computations that read it.
//!
//! # Overview
//!
//! The graph is a two-level map:
//!
//! ```text
//! target (record identity) -> key -> Dep (ordered set of computations)
//! ```
//!
//! Each computation also keeps the inverse list of the `(target, key)`
//! pairs it was added to, so both directions are available even though
//! the runtime never detaches anything.
//!
//! # Design Decisions
//!
//! 1. Targets are keyed by [`TargetId`], not by contents, so two records
//!    with equal entries are separate entries here.
//!
//! 2. Subscriber sets keep insertion order. Notification order within the
//!    plain and derived partitions is therefore deterministic.
//!
//! 3. Looking up a target or key that was never tracked yields nothing
//!    instead of failing.

mod dep;

pub use dep::Dep;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::reactive::Subscriber;
use crate::value::{Key, TargetId};

/// One `(target, key)` pair: the address of a [`Dep`] in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepKey {
    pub target: TargetId,
    pub key: Key,
}

impl DepKey {
    /// Create a pair address.
    pub fn new(target: TargetId, key: Key) -> Self {
        Self { target, key }
    }
}

impl fmt::Display for DepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.key)
    }
}

/// Mapping from observed `(target, key)` pairs to their subscribers.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    targets: HashMap<TargetId, IndexMap<Key, Dep>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `subscriber` to the set for `(target, key)`, creating the set
    /// if needed.
    ///
    /// Returns `true` if the subscriber was newly added. The caller is
    /// responsible for linking the pair back onto the subscriber.
    pub fn subscribe(&mut self, target: TargetId, key: &Key, subscriber: Arc<dyn Subscriber>) -> bool {
        let keys = self.targets.entry(target).or_default();
        if let Some(dep) = keys.get_mut(key) {
            return dep.insert(subscriber);
        }
        let mut dep = Dep::new();
        dep.insert(subscriber);
        keys.insert(key.clone(), dep);
        true
    }

    /// The subscriber set for `(target, key)`, if anything was ever tracked there.
    pub fn dep(&self, target: TargetId, key: &Key) -> Option<&Dep> {
        self.targets.get(&target)?.get(key)
    }

    pub fn subscriber_count(&self, target: TargetId, key: &Key) -> usize {
        self.dep(target, key).map_or(0, Dep::len)
    }

    pub fn contains_target(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    /// Detach every subscriber set of `target`, returning them.
    ///
    /// The caller decides when the sets are dropped; they may hold the last
    /// handles to other records.
    pub fn remove_target(&mut self, target: TargetId) -> Option<IndexMap<Key, Dep>> {
        self.targets.remove(&target)
    }

    /// Number of targets with at least one tracked key.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Tracked keys of `target`, in first-tracked order.
    pub fn tracked_keys(&self, target: TargetId) -> Vec<Key> {
        self.targets
            .get(&target)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }
}
