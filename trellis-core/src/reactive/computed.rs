//! Computed Values
//!
//! A [`Computed`] is a lazy, derived [`Computation`] exposed as a value.
//! Each call to [`Computed::value`] runs the function again, tracking
//! whatever it reads this time, and returns the result. Nothing is cached
//! between reads, so a read always reflects the current state.
//!
//! Being derived, the underlying computation is also notified after every
//! plain effect when one of its dependencies is written.

use std::fmt;

use super::effect::{Computation, EffectOptions};

/// A derived value recomputed on every read.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{computed, reactive};
/// use trellis_core::value::Record;
///
/// let state = reactive(Record::object_from([("a", 1), ("b", 2)]));
/// let s = state.clone();
/// let sum = computed(move || s.get("a").as_i64().unwrap_or(0) + s.get("b").as_i64().unwrap_or(0));
///
/// assert_eq!(sum.value(), Some(3));
/// state.set("a", 10);
/// assert_eq!(sum.value(), Some(12));
/// ```
pub struct Computed<T> {
    effect: Computation<T>,
}

impl<T: 'static> Computed<T> {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            effect: Computation::start(compute, EffectOptions::computed()),
        }
    }

    /// Run the computation and return its result.
    ///
    /// `None` if read from inside its own computation.
    pub fn value(&self) -> Option<T> {
        self.effect.run()
    }

    /// The underlying derived computation.
    pub fn effect(&self) -> &Computation<T> {
        &self.effect
    }
}

/// Create a derived value from `compute`.
pub fn computed<T, F>(compute: F) -> Computed<T>
where
    T: 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Computed::new(compute)
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            effect: self.effect.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("effect", &self.effect)
            .finish()
    }
}
