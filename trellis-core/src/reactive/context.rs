//! Execution Context
//!
//! The execution context tracks which computation is currently running.
//! This enables automatic dependency tracking: when an observed record is
//! read, the runtime registers the computation on top of the stack as a
//! subscriber of that (record, key) pair.
//!
//! # Implementation
//!
//! We use a thread-local stack of running computations. Entering a
//! computation pushes it and returns a guard; dropping the guard pops it.
//! Because the pop lives in `Drop`, the stack stays balanced when a
//! computation panics and the unwind passes through the guard.
//!
//! The stack doubles as the reentrancy guard: a computation that is
//! already somewhere on the stack cannot be entered again, so a body that
//! writes to state it also reads does not recurse into itself.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use super::subscriber::{ComputationId, Subscriber};

thread_local! {
    static EXECUTION_STACK: RefCell<Vec<Arc<dyn Subscriber>>> = const { RefCell::new(Vec::new()) };
}

/// Access point for the current thread's execution stack.
pub struct ExecutionContext;

/// Guard that pops the execution stack when dropped.
///
/// Not `Send`: the stack it pops belongs to the thread that created it.
#[must_use = "the computation leaves the stack as soon as the guard is dropped"]
pub struct ExecutionGuard {
    id: ComputationId,
    _thread_bound: PhantomData<*const ()>,
}

impl ExecutionContext {
    /// Push `subscriber` onto the stack.
    ///
    /// Returns `None` without pushing if the same computation is already
    /// running on this thread.
    pub fn enter(subscriber: Arc<dyn Subscriber>) -> Option<ExecutionGuard> {
        let id = subscriber.id();
        EXECUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|running| running.id() == id) {
                return None;
            }
            stack.push(subscriber);
            Some(ExecutionGuard {
                id,
                _thread_bound: PhantomData,
            })
        })
    }

    /// Check if any computation is running on this thread.
    pub fn is_active() -> bool {
        EXECUTION_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// The computation on top of the stack, if any.
    pub fn current() -> Option<Arc<dyn Subscriber>> {
        EXECUTION_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Id of the computation on top of the stack.
    pub fn current_id() -> Option<ComputationId> {
        EXECUTION_STACK.with(|stack| stack.borrow().last().map(|s| s.id()))
    }

    /// Whether `id` is anywhere on the stack.
    pub fn contains(id: ComputationId) -> bool {
        EXECUTION_STACK.with(|stack| stack.borrow().iter().any(|s| s.id() == id))
    }

    /// Number of computations on the stack.
    pub fn depth() -> usize {
        EXECUTION_STACK.with(|stack| stack.borrow().len())
    }
}

impl ExecutionGuard {
    /// Get the ID of the computation this guard pushed.
    pub fn id(&self) -> ComputationId {
        self.id
    }
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        let popped = EXECUTION_STACK.with(|stack| stack.borrow_mut().pop());

        // Guards are scoped, so they can only be released in LIFO order.
        if let Some(entry) = popped {
            debug_assert_eq!(
                entry.id(),
                self.id,
                "execution stack mismatch: expected {:?}, got {:?}",
                self.id,
                entry.id()
            );
        }
    }
}
