//! Execution-context borrowing.
//!
//! Comparator callables invoked by `find`/`sort`/`==` may call back into
//! script. The container borrows an execution context from the host's pool
//! for the duration of the call, and nested/re-entrant use saves and restores
//! the context's state instead of discarding it. Contexts are passed
//! explicitly — nothing here consults thread-local ambient state.

use core::ops::{Deref, DerefMut};
use std::sync::Mutex;

use tracing::trace;

/// Execution state of a context, as the host scheduler sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// Prepared, no call in flight.
    Ready,
    /// A script call is running on this context.
    Active,
    /// Cooperatively suspended at a re-entry boundary.
    Suspended,
    /// The outermost call completed.
    Finished,
}

/// A script execution context.
///
/// Only the state-stacking part matters to this subsystem: before a container
/// re-enters script on a context, it pushes the current state; when the call
/// returns, it pops. A context mid-execution can therefore be reused for a
/// nested call and still resume correctly afterwards.
#[derive(Debug)]
pub struct ExecContext {
    status: ExecStatus,
    saved: Vec<ExecStatus>,
}

impl ExecContext {
    pub fn new() -> Self {
        Self { status: ExecStatus::Ready, saved: Vec::new() }
    }

    pub fn status(&self) -> ExecStatus {
        self.status
    }

    /// How many saved states are stacked below the current one.
    pub fn nesting_depth(&self) -> usize {
        self.saved.len()
    }

    /// Save the current state and reset to [`ExecStatus::Ready`] for a nested
    /// call.
    pub fn push_state(&mut self) {
        self.saved.push(self.status);
        self.status = ExecStatus::Ready;
    }

    /// Restore the state saved by the matching [`ExecContext::push_state`].
    ///
    /// Returns `false` if there is nothing to pop.
    pub fn pop_state(&mut self) -> bool {
        match self.saved.pop() {
            Some(prev) => {
                self.status = prev;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_status(&mut self, status: ExecStatus) {
        self.status = status;
    }

    /// Run `f` as a script call on this context: push state, mark active,
    /// run, restore. This is the save/restore discipline every comparator
    /// invocation goes through.
    pub fn scoped_call<R>(&mut self, f: impl FnOnce(&mut ExecContext) -> R) -> R {
        self.push_state();
        self.set_status(ExecStatus::Active);
        let result = f(self);
        self.set_status(ExecStatus::Finished);
        self.pop_state();
        result
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The host's pool of reusable execution contexts.
#[derive(Debug, Default)]
pub struct ContextPool {
    free: Mutex<Vec<ExecContext>>,
}

impl ContextPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a context, creating one if the pool is empty. The context
    /// returns to the pool when the guard drops.
    pub fn acquire(&self) -> PooledContext<'_> {
        let ctx = {
            let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
            free.pop()
        };
        let ctx = ctx.unwrap_or_else(|| {
            trace!("context pool empty, creating a fresh context");
            ExecContext::new()
        });
        PooledContext { pool: self, ctx: Some(ctx) }
    }

    /// Number of contexts currently parked in the pool.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn put_back(&self, ctx: ExecContext) {
        let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
        free.push(ctx);
    }
}

/// Guard over a borrowed [`ExecContext`].
#[derive(Debug)]
pub struct PooledContext<'p> {
    pool: &'p ContextPool,
    ctx: Option<ExecContext>,
}

impl Deref for PooledContext<'_> {
    type Target = ExecContext;

    fn deref(&self) -> &ExecContext {
        // Invariant: ctx is Some until drop.
        self.ctx.as_ref().unwrap()
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut ExecContext {
        self.ctx.as_mut().unwrap()
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            debug_assert_eq!(ctx.nesting_depth(), 0, "unbalanced push_state/pop_state");
            ctx.set_status(ExecStatus::Ready);
            self.pool.put_back(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn acquire_reuses_returned_contexts() {
        let pool = ContextPool::new();
        {
            let _ctx = pool.acquire();
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);
        {
            let _ctx = pool.acquire();
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn scoped_call_saves_and_restores_state() {
        let mut ctx = ExecContext::new();
        ctx.set_status(ExecStatus::Suspended);

        let depth_inside = ctx.scoped_call(|ctx| {
            assert_eq!(ctx.status(), ExecStatus::Active);
            // Re-entrant nested call on the same context.
            ctx.scoped_call(|ctx| {
                assert_eq!(ctx.status(), ExecStatus::Active);
                ctx.nesting_depth()
            })
        });

        assert_eq!(depth_inside, 2);
        assert_eq!(ctx.status(), ExecStatus::Suspended);
        assert_eq!(ctx.nesting_depth(), 0);
    }
}
